// Creature records: listing summaries and full detail as mirrored in the
// species cache.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::type_chart::DamageRelations;
use crate::types::PokemonType;

const SPRITE_BASE: &str = "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// Versions whose encounter data is kept on detail records.
pub const KANTO_VERSIONS: [&str; 3] = ["red", "blue", "yellow"];

pub const NO_DESCRIPTION: &str = "No description available.";

/// Entry in the creature listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonSummary {
    pub id: u32,
    /// National dex number. Always equal to `id` for the species listed here.
    pub number: u32,
    pub name: String,
    pub types: Vec<PokemonType>,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStat {
    pub name: String,
    pub base_stat: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStage {
    pub id: u32,
    pub name: String,
    pub image_url: String,
}

/// Encounter locations for one game version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionLocations {
    pub version: String,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Legendary,
    Mythical,
}

impl Rarity {
    /// Legendary wins over mythical when a species reports both.
    pub fn from_flags(is_legendary: bool, is_mythical: bool) -> Self {
        if is_legendary {
            Rarity::Legendary
        } else if is_mythical {
            Rarity::Mythical
        } else {
            Rarity::Common
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Legendary => "legendary",
            Rarity::Mythical => "mythical",
        }
    }
}

/// Full detail record for one creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    pub types: Vec<PokemonType>,
    pub image_url: String,
    pub abilities: Vec<String>,
    pub stats: Vec<BaseStat>,
    pub description: String,
    pub evolution_chain: Vec<EvolutionStage>,
    pub damage_relations: DamageRelations,
    pub kanto_locations: Vec<VersionLocations>,
    pub rarity: Rarity,
}

impl PokemonDetail {
    pub fn base_stat_map(&self) -> BTreeMap<String, u32> {
        self.stats
            .iter()
            .map(|s| (s.name.clone(), s.base_stat))
            .collect()
    }

    pub fn summary(&self) -> PokemonSummary {
        PokemonSummary {
            id: self.id,
            number: self.id,
            name: self.name.clone(),
            types: self.types.clone(),
            image_url: sprite_url(self.id),
        }
    }
}

/// Fields a cached record must carry before it can be served without a
/// refetch. Records written by the bulk seeder of older releases lack them.
pub const REQUIRED_CACHE_FIELDS: [&str; 2] = ["evolution_chain", "kanto_locations"];

/// Whether a raw cached record has every field required to be served as-is.
pub fn is_complete_record(record: &serde_json::Value) -> bool {
    REQUIRED_CACHE_FIELDS
        .iter()
        .all(|field| record.get(field).is_some_and(|v| !v.is_null()))
}

pub fn official_artwork_url(id: u32) -> String {
    format!("{SPRITE_BASE}/other/official-artwork/{id}.png")
}

pub fn sprite_url(id: u32) -> String {
    format!("{SPRITE_BASE}/{id}.png")
}

/// Extract the numeric id from an API resource URL such as
/// `https://pokeapi.co/api/v2/pokemon-species/25/`.
pub fn id_from_resource_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|seg| seg.parse().ok())
}

/// Collapse every run of whitespace (including form feeds and newlines found
/// in flavour text) to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive name match used by the listing search. An empty query
/// matches everything.
pub fn matches_search(summary: &PokemonSummary, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || summary.name.to_lowercase().contains(&query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(name: &str) -> PokemonSummary {
        PokemonSummary {
            id: 1,
            number: 1,
            name: name.to_string(),
            types: vec![PokemonType::Grass],
            image_url: sprite_url(1),
        }
    }

    #[test]
    fn rarity_prefers_legendary() {
        assert_eq!(Rarity::from_flags(true, true), Rarity::Legendary);
        assert_eq!(Rarity::from_flags(false, true), Rarity::Mythical);
        assert_eq!(Rarity::from_flags(false, false), Rarity::Common);
    }

    #[test]
    fn id_from_resource_url_parses_trailing_segment() {
        assert_eq!(
            id_from_resource_url("https://pokeapi.co/api/v2/pokemon-species/25/"),
            Some(25)
        );
        assert_eq!(id_from_resource_url("https://pokeapi.co/api/v2/pokemon/151"), Some(151));
        assert_eq!(id_from_resource_url("https://pokeapi.co/api/v2/pokemon/mew/"), None);
        assert_eq!(id_from_resource_url(""), None);
    }

    #[test]
    fn collapse_whitespace_handles_flavor_text_breaks() {
        assert_eq!(
            collapse_whitespace("A strange seed was\nplanted on its\u{c}back at birth."),
            "A strange seed was planted on its back at birth."
        );
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        assert!(matches_search(&summary("bulbasaur"), "BULB"));
        assert!(matches_search(&summary("bulbasaur"), "saur"));
        assert!(!matches_search(&summary("bulbasaur"), "char"));
        assert!(matches_search(&summary("bulbasaur"), "  "));
    }

    #[test]
    fn complete_record_requires_chain_and_locations() {
        assert!(is_complete_record(&json!({
            "evolution_chain": [],
            "kanto_locations": []
        })));
        assert!(!is_complete_record(&json!({ "evolution_chain": [] })));
        assert!(!is_complete_record(&json!({
            "evolution_chain": [],
            "kanto_locations": null
        })));
    }

    #[test]
    fn artwork_urls() {
        assert!(official_artwork_url(4).ends_with("/other/official-artwork/4.png"));
        assert!(sprite_url(4).ends_with("/pokemon/4.png"));
    }
}
