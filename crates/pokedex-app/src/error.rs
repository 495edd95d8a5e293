// Service-level error type.

use pokedex_api::ApiError;
use pokedex_core::roster::RosterError;
use pokedex_core::type_chart::ChartError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("invalid creature id {id}: ids start at 1")]
    InvalidId { id: u32 },

    #[error("creature #{id} does not exist")]
    NotFound { id: u32 },

    #[error("unknown gym leader `{id}`")]
    UnknownLeader { id: String },

    #[error("species API request failed: {0:#}")]
    Api(anyhow::Error),

    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Classify a failure from the species source while fetching `id`. A 404
    /// from the HTTP client becomes `NotFound`.
    pub fn from_source(err: anyhow::Error, id: u32) -> Self {
        match err.downcast_ref::<ApiError>() {
            Some(api) if api.is_not_found() => AppError::NotFound { id },
            _ => AppError::Api(err),
        }
    }
}
