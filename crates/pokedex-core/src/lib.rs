// Library root: domain types, type chart, roster rules, gym data,
// configuration and SQLite persistence shared by the other crates.

pub mod config;
pub mod db;
pub mod gym;
pub mod pokemon;
pub mod roster;
pub mod store;
pub mod type_chart;
pub mod types;
