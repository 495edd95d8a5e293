// HTTP client for the public species API.
//
// Every GET goes through `get_json`, which retries connection failures,
// timeouts, 429 and 5xx responses with a linear backoff and maps 404 to
// `ApiError::NotFound`. Payloads are decoded into the `dto` shapes and turned
// into domain records by the pure functions in `mapper`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use pokedex_core::config::{ApiConfig, Config};
use pokedex_core::pokemon::{PokemonDetail, PokemonSummary};
use pokedex_core::store::PokemonSource;
use pokedex_core::type_chart::{TypeChart, TypeRelations};
use pokedex_core::types::PokemonType;

use crate::dto::{
    EncounterEntry, EvolutionChainResponse, PokemonListResponse, PokemonResponse,
    SpeciesResponse, TypeResponse,
};
use crate::mapper;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Delay before the first retry; the n-th retry waits n times this.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("resource not found: {url}")]
    NotFound { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// Statuses worth another attempt: rate limiting and server-side failures.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Linear backoff: `base * attempt`, where `attempt` starts at 1.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * attempt
}

// ---------------------------------------------------------------------------
// PokeApiClient
// ---------------------------------------------------------------------------

pub struct PokeApiClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    concurrency: usize,
    chart: TypeChart,
    kanto_versions: Vec<String>,
}

impl PokeApiClient {
    /// Build a client from the `[api]` section. `chart` is used to derive
    /// damage relations for detail records; `kanto_versions` selects which
    /// game versions' encounters are kept.
    pub fn new(
        api: &ApiConfig,
        chart: TypeChart,
        kanto_versions: Vec<String>,
    ) -> Result<Self, ApiError> {
        let base_url = api.base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .user_agent(api.user_agent.clone())
            .build()
            .map_err(|source| ApiError::Http {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            base_url,
            max_retries: api.max_retries,
            retry_delay: RETRY_BASE_DELAY,
            concurrency: api.concurrency.max(1),
            chart,
            kanto_versions,
        })
    }

    pub fn from_config(config: &Config, chart: TypeChart) -> Result<Self, ApiError> {
        Self::new(&config.api, chart, config.pokedex.kanto_versions.clone())
    }

    /// Override the base retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn chart(&self) -> &TypeChart {
        &self.chart
    }

    pub(crate) fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Absolute URL for a path relative to the API root.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            match self.http.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes = response.bytes().await.map_err(|source| ApiError::Http {
                            url: url.to_string(),
                            source,
                        })?;
                        return serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
                            url: url.to_string(),
                            message: e.to_string(),
                        });
                    }
                    if status == StatusCode::NOT_FOUND {
                        return Err(ApiError::NotFound {
                            url: url.to_string(),
                        });
                    }
                    if is_retryable_status(status) && attempt < self.max_retries {
                        attempt += 1;
                        warn!(url, status = status.as_u16(), attempt, "retrying request");
                        tokio::time::sleep(backoff_delay(self.retry_delay, attempt)).await;
                        continue;
                    }
                    return Err(ApiError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                Err(e) => {
                    if (e.is_connect() || e.is_timeout()) && attempt < self.max_retries {
                        attempt += 1;
                        warn!(url, error = %e, attempt, "retrying request");
                        tokio::time::sleep(backoff_delay(self.retry_delay, attempt)).await;
                        continue;
                    }
                    return Err(ApiError::Http {
                        url: url.to_string(),
                        source: e,
                    });
                }
            }
        }
    }

    /// Full detail for one species: the pokemon, species and encounter
    /// resources are requested together, then the evolution chain.
    pub async fn fetch_detail(&self, id: u32) -> Result<PokemonDetail, ApiError> {
        let pokemon_url = self.endpoint(&format!("pokemon/{id}"));
        let species_url = self.endpoint(&format!("pokemon-species/{id}"));
        let encounters_url = self.endpoint(&format!("pokemon/{id}/encounters"));

        let (pokemon, species, encounters) = tokio::try_join!(
            self.get_json::<PokemonResponse>(&pokemon_url),
            self.get_json::<SpeciesResponse>(&species_url),
            self.get_json::<Vec<EncounterEntry>>(&encounters_url),
        )?;

        let chain = match &species.evolution_chain {
            Some(resource) => Some(self.get_json::<EvolutionChainResponse>(&resource.url).await?),
            None => None,
        };

        debug!(id, name = %pokemon.name, "fetched species detail");
        Ok(mapper::to_detail(
            &pokemon,
            &species,
            &encounters,
            chain.as_ref(),
            &self.chart,
            &self.kanto_versions,
        ))
    }

    /// First `limit` species with their types, sorted by id. Type lookups
    /// run with at most `concurrency` requests in flight.
    pub async fn fetch_listing(&self, limit: u32) -> Result<Vec<PokemonSummary>, ApiError> {
        let url = format!("{}?limit={limit}", self.endpoint("pokemon"));
        let listing: PokemonListResponse = self.get_json(&url).await?;
        info!(entries = listing.results.len(), "fetched species index");

        let summaries: Vec<Option<PokemonSummary>> = stream::iter(listing.results)
            .map(|entry| async move {
                let pokemon: PokemonResponse = self.get_json(&entry.url).await?;
                let types = mapper::types_from_slots(&pokemon.types);
                Ok::<_, ApiError>(mapper::summary_from_listing(&entry, types))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut summaries: Vec<PokemonSummary> = summaries.into_iter().flatten().collect();
        summaries.sort_by_key(|s| s.id);
        Ok(summaries)
    }

    pub async fn fetch_type(&self, pokemon_type: PokemonType) -> Result<TypeRelations, ApiError> {
        let url = self.endpoint(&format!("type/{}", pokemon_type.name()));
        let response: TypeResponse = self.get_json(&url).await?;
        Ok(mapper::type_relations(&response))
    }
}

#[async_trait]
impl PokemonSource for PokeApiClient {
    async fn fetch_pokemon(&self, id: u32) -> anyhow::Result<PokemonDetail> {
        Ok(self.fetch_detail(id).await?)
    }

    async fn list_pokemon(&self, limit: u32) -> anyhow::Result<Vec<PokemonSummary>> {
        Ok(self.fetch_listing(limit).await?)
    }

    async fn fetch_type_relations(&self, pokemon_type: PokemonType) -> anyhow::Result<TypeRelations> {
        Ok(self.fetch_type(pokemon_type).await?)
    }
}
