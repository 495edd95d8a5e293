// In-memory collaborators shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use pokedex_api::ApiError;
use pokedex_core::pokemon::{
    official_artwork_url, BaseStat, EvolutionStage, PokemonDetail, PokemonSummary, Rarity,
};
use pokedex_core::roster::Roster;
use pokedex_core::store::{PokemonSource, RosterStore, SpeciesCache};
use pokedex_core::type_chart::{TypeChart, TypeRelations};
use pokedex_core::types::PokemonType;

pub fn detail(id: u32, name: &str, types: &[PokemonType]) -> PokemonDetail {
    PokemonDetail {
        id,
        name: name.to_string(),
        types: types.to_vec(),
        image_url: official_artwork_url(id),
        abilities: vec![format!("{name}-ability"), "run-away".to_string()],
        stats: ["hp", "attack", "defense", "special-attack", "special-defense", "speed"]
            .iter()
            .map(|s| BaseStat {
                name: s.to_string(),
                base_stat: 50,
            })
            .collect(),
        description: format!("{name} entry"),
        evolution_chain: vec![EvolutionStage {
            id,
            name: name.to_string(),
            image_url: official_artwork_url(id),
        }],
        damage_relations: TypeChart::builtin().damage_relations(types),
        kanto_locations: vec![],
        rarity: Rarity::Common,
    }
}

/// Species data served from a map, counting every call. Ids absent from the
/// map answer with a 404; ids in `failing` answer with a transport error.
#[derive(Default)]
pub struct FakeSource {
    pub species: HashMap<u32, PokemonDetail>,
    pub failing: HashSet<u32>,
    pub fail_listing: bool,
    pub detail_calls: AtomicUsize,
    pub listing_calls: AtomicUsize,
    pub type_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with(details: Vec<PokemonDetail>) -> Self {
        FakeSource {
            species: details.into_iter().map(|d| (d.id, d)).collect(),
            ..Default::default()
        }
    }

    /// A handful of starters plus the teams of Brock and Misty.
    pub fn kanto() -> Self {
        use PokemonType::*;
        Self::with(vec![
            detail(1, "bulbasaur", &[Grass, Poison]),
            detail(4, "charmander", &[Fire]),
            detail(7, "squirtle", &[Water]),
            detail(16, "pidgey", &[Normal, Flying]),
            detail(25, "pikachu", &[Electric]),
            detail(54, "psyduck", &[Water]),
            detail(63, "abra", &[Psychic]),
            detail(66, "machop", &[Fighting]),
            detail(74, "geodude", &[Rock, Ground]),
            detail(95, "onix", &[Rock, Ground]),
            detail(120, "staryu", &[Water]),
            detail(121, "starmie", &[Water, Psychic]),
        ])
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PokemonSource for FakeSource {
    async fn fetch_pokemon(&self, id: u32) -> anyhow::Result<PokemonDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&id) {
            anyhow::bail!("connection reset while fetching #{id}");
        }
        match self.species.get(&id) {
            Some(d) => Ok(d.clone()),
            None => Err(ApiError::NotFound {
                url: format!("pokemon/{id}"),
            }
            .into()),
        }
    }

    async fn list_pokemon(&self, limit: u32) -> anyhow::Result<Vec<PokemonSummary>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            anyhow::bail!("listing unavailable");
        }
        let mut entries: Vec<PokemonSummary> = self
            .species
            .values()
            .filter(|d| d.id <= limit)
            .map(PokemonDetail::summary)
            .collect();
        entries.sort_by_key(|s| s.id);
        Ok(entries)
    }

    async fn fetch_type_relations(&self, pokemon_type: PokemonType) -> anyhow::Result<TypeRelations> {
        self.type_calls.fetch_add(1, Ordering::SeqCst);
        let chart = TypeChart::builtin();
        let pick = |value: f32| -> Vec<String> {
            PokemonType::ALL
                .iter()
                .filter(|&&a| chart.multiplier(a, pokemon_type) == value)
                .map(|a| a.name().to_string())
                .collect()
        };
        Ok(TypeRelations {
            name: pokemon_type.name().to_string(),
            double_damage_from: pick(2.0),
            half_damage_from: pick(0.5),
            no_damage_from: pick(0.0),
        })
    }
}

/// Cache whose every operation fails.
pub struct BrokenCache;

impl SpeciesCache for BrokenCache {
    fn load_species(&self, _id: u32) -> anyhow::Result<Option<serde_json::Value>> {
        anyhow::bail!("disk I/O error")
    }

    fn store_species(&self, _detail: &PokemonDetail) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    fn load_index(&self, _limit: u32) -> anyhow::Result<Option<Vec<PokemonSummary>>> {
        anyhow::bail!("disk I/O error")
    }

    fn store_index(&self, _limit: u32, _entries: &[PokemonSummary]) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    fn clear_species(&self) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    fn load_type_chart(&self) -> anyhow::Result<Option<TypeChart>> {
        anyhow::bail!("disk I/O error")
    }

    fn save_type_chart(&self, _chart: &TypeChart) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }
}

/// Roster store kept in a map; `fail_saves` makes every save fail.
#[derive(Default)]
pub struct MemoryRosters {
    pub rosters: Mutex<HashMap<String, Roster>>,
    pub fail_saves: bool,
}

impl RosterStore for MemoryRosters {
    fn load_roster(&self, user_id: &str) -> anyhow::Result<Roster> {
        let rosters = self.rosters.lock().expect("roster map poisoned");
        Ok(rosters.get(user_id).cloned().unwrap_or_default())
    }

    fn save_roster(&self, user_id: &str, roster: &Roster) -> anyhow::Result<()> {
        if self.fail_saves {
            anyhow::bail!("write rejected");
        }
        let mut rosters = self.rosters.lock().expect("roster map poisoned");
        rosters.insert(user_id.to_string(), roster.clone());
        Ok(())
    }
}
