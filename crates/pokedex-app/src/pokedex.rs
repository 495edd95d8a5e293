// Read-through access to species data: detail records, the listing, bulk
// seeding of the cache and the synced type chart.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use pokedex_core::config::MAX_POKEDEX_LIMIT;
use pokedex_core::pokemon::{is_complete_record, matches_search, PokemonDetail, PokemonSummary};
use pokedex_core::store::{PokemonSource, SpeciesCache};
use pokedex_core::type_chart::TypeChart;
use pokedex_core::types::PokemonType;

use crate::error::{AppError, AppResult};

/// Outcome of a bulk cache seed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedReport {
    /// Records fetched and written.
    pub cached: usize,
    /// Ids whose cached record was already complete.
    pub skipped: usize,
    /// Ids that could not be fetched or stored.
    pub failed: Vec<u32>,
}

/// The persisted chart, or the builtin one when none was synced or it cannot
/// be read.
pub fn load_type_chart(cache: &dyn SpeciesCache) -> TypeChart {
    match cache.load_type_chart() {
        Ok(Some(chart)) => chart,
        Ok(None) => TypeChart::builtin(),
        Err(e) => {
            warn!(error = %e, "failed to load synced type chart, using builtin");
            TypeChart::builtin()
        }
    }
}

pub struct Pokedex {
    source: Arc<dyn PokemonSource>,
    cache: Arc<dyn SpeciesCache>,
    limit: u32,
}

impl Pokedex {
    /// `limit` is the default listing size.
    pub fn new(source: Arc<dyn PokemonSource>, cache: Arc<dyn SpeciesCache>, limit: u32) -> Self {
        Self {
            source,
            cache,
            limit: limit.clamp(1, MAX_POKEDEX_LIMIT),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Detail for one creature. A complete cached record is served as-is;
    /// anything else is fetched upstream and written through to the cache.
    /// Cache failures are logged and never fail the call.
    pub async fn get_pokemon(&self, id: u32) -> AppResult<PokemonDetail> {
        if id == 0 {
            return Err(AppError::InvalidId { id });
        }

        if let Some(detail) = self.cached_detail(id) {
            debug!(id, "species cache hit");
            return Ok(detail);
        }

        debug!(id, "species cache miss");
        let detail = self
            .source
            .fetch_pokemon(id)
            .await
            .map_err(|e| AppError::from_source(e, id))?;

        if let Err(e) = self.cache.store_species(&detail) {
            warn!(id, error = %e, "failed to write species record to cache");
        }
        Ok(detail)
    }

    /// Cached record for `id` if it is complete and well formed.
    fn cached_detail(&self, id: u32) -> Option<PokemonDetail> {
        let record = match self.cache.load_species(id) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(id, error = %e, "failed to read species cache");
                return None;
            }
        };

        if !is_complete_record(&record) {
            debug!(id, "cached record is incomplete");
            return None;
        }

        match serde_json::from_value(record) {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(id, error = %e, "cached record is malformed");
                None
            }
        }
    }

    /// The first `limit` creatures (default: the configured limit), served
    /// from the listing mirror once it has been filled for that range.
    pub async fn list(&self, limit: Option<u32>) -> AppResult<Vec<PokemonSummary>> {
        let limit = limit.unwrap_or(self.limit).min(MAX_POKEDEX_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        match self.cache.load_index(limit) {
            Ok(Some(entries)) => {
                debug!(limit, count = entries.len(), "listing served from mirror");
                return Ok(entries);
            }
            Ok(None) => debug!(limit, "listing mirror does not cover range"),
            Err(e) => warn!(error = %e, "failed to read listing mirror"),
        }

        let entries = self.source.list_pokemon(limit).await.map_err(AppError::Api)?;
        if let Err(e) = self.cache.store_index(limit, &entries) {
            warn!(error = %e, "failed to mirror listing");
        }
        info!(count = entries.len(), "listing fetched");
        Ok(entries)
    }

    /// Listing filtered by a name fragment and, optionally, a type.
    pub async fn search(
        &self,
        limit: Option<u32>,
        query: &str,
        type_filter: Option<PokemonType>,
    ) -> AppResult<Vec<PokemonSummary>> {
        let entries = self.list(limit).await?;
        Ok(entries
            .into_iter()
            .filter(|s| matches_search(s, query))
            .filter(|s| type_filter.map_or(true, |t| s.types.contains(&t)))
            .collect())
    }

    /// Fetch and cache every id in `ids`, one at a time, pausing `delay`
    /// between upstream requests. Failures are counted and the run goes on.
    pub async fn seed(&self, ids: RangeInclusive<u32>, delay: Duration) -> SeedReport {
        let mut report = SeedReport::default();
        let mut first_request = true;

        for id in ids {
            if id == 0 {
                continue;
            }
            if self.cached_detail(id).is_some() {
                report.skipped += 1;
                continue;
            }

            if !first_request && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            first_request = false;

            let outcome = match self.source.fetch_pokemon(id).await {
                Ok(detail) => self.cache.store_species(&detail),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => {
                    report.cached += 1;
                    debug!(id, "seeded");
                }
                Err(e) => {
                    warn!(id, error = %e, "failed to seed species");
                    report.failed.push(id);
                }
            }
        }

        info!(
            cached = report.cached,
            skipped = report.skipped,
            failed = report.failed.len(),
            "seed finished"
        );
        report
    }

    /// Rebuild the type chart from upstream relations for all eighteen
    /// types and persist it. Cached detail records carry damage relations
    /// computed from the previous chart, so they are dropped.
    pub async fn sync_type_chart(&self) -> AppResult<TypeChart> {
        let mut relations = Vec::with_capacity(PokemonType::ALL.len());
        for t in PokemonType::ALL {
            let rel = self.source.fetch_type_relations(t).await.map_err(AppError::Api)?;
            relations.push(rel);
        }

        let chart = TypeChart::from_relations(&relations)?;
        self.cache.save_type_chart(&chart).map_err(AppError::Storage)?;
        self.cache.clear_species().map_err(AppError::Storage)?;
        info!(types = relations.len(), "type chart synced, species cache cleared");
        Ok(chart)
    }

    pub fn load_type_chart(&self) -> TypeChart {
        load_type_chart(self.cache.as_ref())
    }
}
