// Elemental types used by the type chart and every creature record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The 18 elemental categories, in the order the species API numbers them.
///
/// The derived `Ord` follows declaration order, so sorted collections of
/// types read the same way the API lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PokemonType {
    pub const ALL: [PokemonType; 18] = [
        PokemonType::Normal,
        PokemonType::Fire,
        PokemonType::Water,
        PokemonType::Electric,
        PokemonType::Grass,
        PokemonType::Ice,
        PokemonType::Fighting,
        PokemonType::Poison,
        PokemonType::Ground,
        PokemonType::Flying,
        PokemonType::Psychic,
        PokemonType::Bug,
        PokemonType::Rock,
        PokemonType::Ghost,
        PokemonType::Dragon,
        PokemonType::Dark,
        PokemonType::Steel,
        PokemonType::Fairy,
    ];

    /// Parse an API type name. Case-insensitive, surrounding whitespace ignored.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Some(PokemonType::Normal),
            "fire" => Some(PokemonType::Fire),
            "water" => Some(PokemonType::Water),
            "electric" => Some(PokemonType::Electric),
            "grass" => Some(PokemonType::Grass),
            "ice" => Some(PokemonType::Ice),
            "fighting" => Some(PokemonType::Fighting),
            "poison" => Some(PokemonType::Poison),
            "ground" => Some(PokemonType::Ground),
            "flying" => Some(PokemonType::Flying),
            "psychic" => Some(PokemonType::Psychic),
            "bug" => Some(PokemonType::Bug),
            "rock" => Some(PokemonType::Rock),
            "ghost" => Some(PokemonType::Ghost),
            "dragon" => Some(PokemonType::Dragon),
            "dark" => Some(PokemonType::Dark),
            "steel" => Some(PokemonType::Steel),
            "fairy" => Some(PokemonType::Fairy),
            _ => None,
        }
    }

    /// Lower-case name as used in API paths and payloads.
    pub fn name(&self) -> &'static str {
        match self {
            PokemonType::Normal => "normal",
            PokemonType::Fire => "fire",
            PokemonType::Water => "water",
            PokemonType::Electric => "electric",
            PokemonType::Grass => "grass",
            PokemonType::Ice => "ice",
            PokemonType::Fighting => "fighting",
            PokemonType::Poison => "poison",
            PokemonType::Ground => "ground",
            PokemonType::Flying => "flying",
            PokemonType::Psychic => "psychic",
            PokemonType::Bug => "bug",
            PokemonType::Rock => "rock",
            PokemonType::Ghost => "ghost",
            PokemonType::Dragon => "dragon",
            PokemonType::Dark => "dark",
            PokemonType::Steel => "steel",
            PokemonType::Fairy => "fairy",
        }
    }

    /// Position in `ALL`, used to index the chart table.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Join types for display, e.g. `grass/poison`.
pub fn join_types(types: &[PokemonType]) -> String {
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join("/")
}
