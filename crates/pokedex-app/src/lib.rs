// Library root: the services the command line drives, built on the core
// domain and the species API client.

pub mod error;
pub mod pokedex;
pub mod team;

#[cfg(test)]
mod fixtures;

pub use error::{AppError, AppResult};
pub use pokedex::{Pokedex, SeedReport};
pub use team::{GymReport, LeaderMemberView, TeamService};
