// Library root: the species API client, its wire types, payload mapping and
// the held-item catalogue.

pub mod client;
pub mod dto;
pub mod items;
pub mod mapper;

pub use client::{ApiError, PokeApiClient};
pub use items::HeldItem;
