// Fixed list of Kanto gym leaders and the roster-vs-leader type matchup.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::roster::{Roster, RosterMember};
use crate::type_chart::TypeChart;
use crate::types::PokemonType;

const TRAINER_SPRITE_BASE: &str = "https://img.pokemondb.net/sprites/trainers/red-blue";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderPokemon {
    pub pokemon_id: u32,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GymLeader {
    pub id: String,
    pub name: String,
    pub city: String,
    pub specialty: PokemonType,
    pub image_url: String,
    /// Badge order, starting at 1.
    pub order: u8,
    pub team: Vec<LeaderPokemon>,
}

impl GymLeader {
    /// Distinct species ids on the leader's team, in team order.
    pub fn distinct_pokemon_ids(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        self.team
            .iter()
            .map(|p| p.pokemon_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

fn leader(
    id: &str,
    name: &str,
    city: &str,
    specialty: PokemonType,
    order: u8,
    team: &[(u32, u8)],
) -> GymLeader {
    GymLeader {
        id: id.to_string(),
        name: name.to_string(),
        city: city.to_string(),
        specialty,
        image_url: format!("{TRAINER_SPRITE_BASE}/{id}.png"),
        order,
        team: team
            .iter()
            .map(|&(pokemon_id, level)| LeaderPokemon { pokemon_id, level })
            .collect(),
    }
}

/// The eight Kanto leaders in badge order.
pub fn kanto_leaders() -> Vec<GymLeader> {
    use PokemonType::*;
    vec![
        leader("brock", "Brock", "Pewter City", Rock, 1, &[(74, 12), (95, 14)]),
        leader("misty", "Misty", "Cerulean City", Water, 2, &[(120, 18), (121, 21)]),
        leader(
            "lt-surge",
            "Lt. Surge",
            "Vermilion City",
            Electric,
            3,
            &[(100, 21), (25, 18), (26, 24)],
        ),
        leader(
            "erika",
            "Erika",
            "Celadon City",
            Grass,
            4,
            &[(71, 29), (114, 24), (45, 29)],
        ),
        leader(
            "koga",
            "Koga",
            "Fuchsia City",
            Poison,
            5,
            &[(109, 37), (89, 39), (109, 37), (110, 43)],
        ),
        leader(
            "sabrina",
            "Sabrina",
            "Saffron City",
            Psychic,
            6,
            &[(64, 38), (122, 37), (49, 38), (65, 43)],
        ),
        leader(
            "blaine",
            "Blaine",
            "Cinnabar Island",
            Fire,
            7,
            &[(58, 42), (78, 40), (77, 42), (59, 47)],
        ),
        leader(
            "giovanni",
            "Giovanni",
            "Viridian City",
            Ground,
            8,
            &[(111, 45), (31, 42), (112, 50), (34, 45), (50, 44)],
        ),
    ]
}

/// Look up a leader by id, ignoring case.
pub fn find_leader(id: &str) -> Option<GymLeader> {
    let id = id.trim();
    kanto_leaders()
        .into_iter()
        .find(|l| l.id.eq_ignore_ascii_case(id))
}

/// Which roster members hit the leader's team hard and which ones the
/// leader's team shrugs off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matchup {
    /// Attacking types super effective against at least one leader type.
    pub leader_weaknesses: BTreeSet<PokemonType>,
    /// Attacking types resisted (or ignored) by at least one leader type.
    pub leader_resistances: BTreeSet<PokemonType>,
    pub advantaged: Vec<RosterMember>,
    pub disadvantaged: Vec<RosterMember>,
}

impl Matchup {
    /// Evaluate a roster against the union of types on a leader's team.
    ///
    /// Each leader type is looked at on its own, so a dual-typed opponent
    /// contributes the weaknesses of both of its types. A roster member can
    /// land in both lists.
    pub fn evaluate(chart: &TypeChart, roster: &Roster, leader_types: &[PokemonType]) -> Self {
        let distinct: BTreeSet<PokemonType> = leader_types.iter().copied().collect();
        if roster.is_empty() || distinct.is_empty() {
            return Matchup::default();
        }

        let leader_weaknesses: BTreeSet<PokemonType> = distinct
            .iter()
            .flat_map(|t| chart.super_effective_against(*t))
            .collect();
        let leader_resistances: BTreeSet<PokemonType> = distinct
            .iter()
            .flat_map(|t| chart.resisted_by(*t))
            .collect();

        let weak: HashSet<PokemonType> = leader_weaknesses.iter().copied().collect();
        let resist: HashSet<PokemonType> = leader_resistances.iter().copied().collect();

        Matchup {
            advantaged: roster.iter().filter(|m| m.has_any_type(&weak)).cloned().collect(),
            disadvantaged: roster.iter().filter(|m| m.has_any_type(&resist)).cloned().collect(),
            leader_weaknesses,
            leader_resistances,
        }
    }
}
