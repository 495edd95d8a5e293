// Seams to the outside world: the species data source, the roster store and
// the local species mirror.

use async_trait::async_trait;

use crate::pokemon::{PokemonDetail, PokemonSummary};
use crate::roster::Roster;
use crate::type_chart::{TypeChart, TypeRelations};
use crate::types::PokemonType;

/// Upstream species data. The HTTP client implements this; tests use
/// in-memory fakes.
#[async_trait]
pub trait PokemonSource: Send + Sync {
    async fn fetch_pokemon(&self, id: u32) -> anyhow::Result<PokemonDetail>;

    /// First `limit` species by national dex number, in id order.
    async fn list_pokemon(&self, limit: u32) -> anyhow::Result<Vec<PokemonSummary>>;

    async fn fetch_type_relations(&self, pokemon_type: PokemonType) -> anyhow::Result<TypeRelations>;
}

/// Per-user roster persistence.
pub trait RosterStore: Send + Sync {
    /// The user's roster, or an empty one if nothing was saved yet.
    fn load_roster(&self, user_id: &str) -> anyhow::Result<Roster>;

    /// Replace the user's stored roster.
    fn save_roster(&self, user_id: &str, roster: &Roster) -> anyhow::Result<()>;
}

/// Local mirror of species data: detail records keyed by id, the listing and
/// a type chart synced from upstream.
pub trait SpeciesCache: Send + Sync {
    /// Raw stored record. Callers decide whether it is complete enough to use.
    fn load_species(&self, id: u32) -> anyhow::Result<Option<serde_json::Value>>;

    fn store_species(&self, detail: &PokemonDetail) -> anyhow::Result<()>;

    /// Mirrored listing entries with ids in `1..=limit`, in id order, or
    /// `None` when the mirror was never filled for that range.
    fn load_index(&self, limit: u32) -> anyhow::Result<Option<Vec<PokemonSummary>>>;

    /// Mirror a listing fetched for `1..=limit`.
    fn store_index(&self, limit: u32, entries: &[PokemonSummary]) -> anyhow::Result<()>;

    /// Drop every detail record and the listing mirror.
    fn clear_species(&self) -> anyhow::Result<()>;

    fn load_type_chart(&self) -> anyhow::Result<Option<TypeChart>>;

    fn save_type_chart(&self, chart: &TypeChart) -> anyhow::Result<()>;
}
