// Library root: argument parsing, command dispatch and text rendering for the
// `pokedex` binary, exposed so they can be tested without a terminal.

pub mod cli;
pub mod commands;
pub mod render;
