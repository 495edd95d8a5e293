// Roster construction, member editing and team-wide weakness counts.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pokemon::PokemonDetail;
use crate::type_chart::TypeChart;
use crate::types::PokemonType;

pub const MAX_ROSTER_SIZE: usize = 6;
pub const MAX_MOVES: usize = 4;
pub const DEFAULT_LEVEL: u8 = 5;
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 100;

#[derive(Debug, Error, PartialEq)]
pub enum RosterError {
    #[error("roster is full ({MAX_ROSTER_SIZE} members)")]
    Full,

    #[error("#{pokemon_id} is already on the roster")]
    Duplicate { pokemon_id: u32 },

    #[error("#{pokemon_id} is not on the roster")]
    NotFound { pokemon_id: u32 },

    #[error("level must be between {MIN_LEVEL} and {MAX_LEVEL}, got {level}")]
    InvalidLevel { level: u8 },

    #[error("at most {MAX_MOVES} moves allowed, got {count}")]
    TooManyMoves { count: usize },

    #[error("move `{name}` listed more than once")]
    DuplicateMove { name: String },
}

/// Stat value at a given level. HP gets the level plus a flat 10 on top;
/// every other stat gets a flat 5.
pub fn calculate_stat(base: u32, level: u8, stat_name: &str) -> u32 {
    let scaled = (2 * base * u32::from(level)) / 100;
    if stat_name.eq_ignore_ascii_case("hp") {
        scaled + u32::from(level) + 10
    } else {
        scaled + 5
    }
}

/// Apply [`calculate_stat`] to a whole base-stat map.
pub fn calculate_stats(base_stats: &BTreeMap<String, u32>, level: u8) -> BTreeMap<String, u32> {
    base_stats
        .iter()
        .map(|(name, &base)| (name.clone(), calculate_stat(base, level, name)))
        .collect()
}

/// A creature on a user's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    pub pokemon_id: u32,
    pub name: String,
    pub image_url: String,
    pub types: Vec<PokemonType>,
    pub level: u8,
    pub ability: String,
    pub held_item: Option<String>,
    pub moves: Vec<String>,
    pub base_stats: BTreeMap<String, u32>,
}

impl RosterMember {
    /// New member at the default level with its first listed ability.
    pub fn from_detail(detail: &PokemonDetail) -> Self {
        RosterMember {
            pokemon_id: detail.id,
            name: detail.name.clone(),
            image_url: detail.image_url.clone(),
            types: detail.types.clone(),
            level: DEFAULT_LEVEL,
            ability: detail.abilities.first().cloned().unwrap_or_default(),
            held_item: None,
            moves: Vec::new(),
            base_stats: detail.base_stat_map(),
        }
    }

    /// Stats at the member's current level. Derived on every call so they
    /// can never drift from `level`.
    pub fn calculated_stats(&self) -> BTreeMap<String, u32> {
        calculate_stats(&self.base_stats, self.level)
    }

    pub fn has_any_type(&self, types: &HashSet<PokemonType>) -> bool {
        self.types.iter().any(|t| types.contains(t))
    }
}

/// Partial edit of a roster member. `None` leaves a field untouched;
/// `held_item: Some(None)` clears the item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberUpdate {
    pub level: Option<u8>,
    pub ability: Option<String>,
    pub held_item: Option<Option<String>>,
    pub moves: Option<Vec<String>>,
}

impl MemberUpdate {
    pub fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.ability.is_none()
            && self.held_item.is_none()
            && self.moves.is_none()
    }

    fn validate(&self) -> Result<(), RosterError> {
        if let Some(level) = self.level {
            if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
                return Err(RosterError::InvalidLevel { level });
            }
        }
        if let Some(moves) = &self.moves {
            if moves.len() > MAX_MOVES {
                return Err(RosterError::TooManyMoves { count: moves.len() });
            }
            let mut seen = HashSet::new();
            for m in moves {
                if !seen.insert(m.as_str()) {
                    return Err(RosterError::DuplicateMove { name: m.clone() });
                }
            }
        }
        Ok(())
    }
}

/// A user's roster: at most six distinct creatures, in the order added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    members: Vec<RosterMember>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a roster from stored members, enforcing the same rules as
    /// [`Roster::add`].
    pub fn from_members(members: Vec<RosterMember>) -> Result<Self, RosterError> {
        let mut roster = Roster::new();
        for m in members {
            roster.add(m)?;
        }
        Ok(roster)
    }

    pub fn members(&self) -> &[RosterMember] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterMember> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_ROSTER_SIZE
    }

    pub fn contains(&self, pokemon_id: u32) -> bool {
        self.members.iter().any(|m| m.pokemon_id == pokemon_id)
    }

    pub fn get(&self, pokemon_id: u32) -> Option<&RosterMember> {
        self.members.iter().find(|m| m.pokemon_id == pokemon_id)
    }

    /// Append a member. Duplicates are reported before a full roster.
    pub fn add(&mut self, member: RosterMember) -> Result<(), RosterError> {
        if self.contains(member.pokemon_id) {
            return Err(RosterError::Duplicate {
                pokemon_id: member.pokemon_id,
            });
        }
        if self.is_full() {
            return Err(RosterError::Full);
        }
        self.members.push(member);
        Ok(())
    }

    pub fn remove(&mut self, pokemon_id: u32) -> Result<RosterMember, RosterError> {
        let idx = self
            .members
            .iter()
            .position(|m| m.pokemon_id == pokemon_id)
            .ok_or(RosterError::NotFound { pokemon_id })?;
        Ok(self.members.remove(idx))
    }

    /// Apply a partial edit. The whole update is validated before any field
    /// changes, so a rejected update leaves the member as it was.
    pub fn update(
        &mut self,
        pokemon_id: u32,
        update: MemberUpdate,
    ) -> Result<&RosterMember, RosterError> {
        update.validate()?;
        let member = self
            .members
            .iter_mut()
            .find(|m| m.pokemon_id == pokemon_id)
            .ok_or(RosterError::NotFound { pokemon_id })?;

        if let Some(level) = update.level {
            member.level = level;
        }
        if let Some(ability) = update.ability {
            member.ability = ability;
        }
        if let Some(held_item) = update.held_item {
            member.held_item = held_item;
        }
        if let Some(moves) = update.moves {
            member.moves = moves;
        }
        Ok(member)
    }
}

/// Per attacking type, how many roster members take super-effective damage
/// from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamWeaknesses {
    counts: BTreeMap<PokemonType, usize>,
}

impl TeamWeaknesses {
    pub fn compute(roster: &Roster, chart: &TypeChart) -> Self {
        let mut counts = BTreeMap::new();
        for member in roster.iter() {
            for t in chart.damage_relations(&member.types).weaknesses {
                *counts.entry(t).or_insert(0) += 1;
            }
        }
        TeamWeaknesses { counts }
    }

    pub fn count(&self, attacking: PokemonType) -> usize {
        self.counts.get(&attacking).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Most shared weakness first; ties in type order.
    pub fn sorted(&self) -> Vec<(PokemonType, usize)> {
        let mut entries: Vec<(PokemonType, usize)> =
            self.counts.iter().map(|(t, c)| (*t, *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries
    }

    /// Attacking types that hit at least `min` members super effectively.
    pub fn shared(&self, min: usize) -> Vec<PokemonType> {
        self.counts
            .iter()
            .filter(|(_, &c)| c >= min)
            .map(|(t, _)| *t)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokemon::{BaseStat, Rarity};
    use crate::type_chart::DamageRelations;
    use PokemonType::*;

    fn member(id: u32, types: Vec<PokemonType>) -> RosterMember {
        RosterMember {
            pokemon_id: id,
            name: format!("mon-{id}"),
            image_url: String::new(),
            types,
            level: DEFAULT_LEVEL,
            ability: "overgrow".to_string(),
            held_item: None,
            moves: vec![],
            base_stats: BTreeMap::from([
                ("hp".to_string(), 45),
                ("attack".to_string(), 49),
            ]),
        }
    }

    fn detail() -> PokemonDetail {
        PokemonDetail {
            id: 1,
            name: "bulbasaur".to_string(),
            types: vec![Grass, Poison],
            image_url: "art.png".to_string(),
            abilities: vec!["overgrow".to_string(), "chlorophyll".to_string()],
            stats: vec![
                BaseStat { name: "hp".to_string(), base_stat: 45 },
                BaseStat { name: "attack".to_string(), base_stat: 49 },
                BaseStat { name: "speed".to_string(), base_stat: 45 },
            ],
            description: "seed".to_string(),
            evolution_chain: vec![],
            damage_relations: DamageRelations::default(),
            kanto_locations: vec![],
            rarity: Rarity::Common,
        }
    }

    #[test]
    fn stat_formula_matches_known_values() {
        // Bulbasaur at level 5: hp 45 -> 4 + 5 + 10, attack 49 -> 4 + 5.
        assert_eq!(calculate_stat(45, 5, "hp"), 19);
        assert_eq!(calculate_stat(49, 5, "attack"), 9);
        // Level 100 doubles the base before the flat bonus.
        assert_eq!(calculate_stat(45, 100, "HP"), 45 * 2 + 100 + 10);
        assert_eq!(calculate_stat(100, 50, "special-attack"), 105);
    }

    #[test]
    fn from_detail_uses_defaults() {
        let m = RosterMember::from_detail(&detail());
        assert_eq!(m.pokemon_id, 1);
        assert_eq!(m.level, DEFAULT_LEVEL);
        assert_eq!(m.ability, "overgrow");
        assert!(m.held_item.is_none());
        assert!(m.moves.is_empty());
        assert_eq!(m.base_stats.get("speed"), Some(&45));
        assert_eq!(m.calculated_stats().get("hp"), Some(&19));
    }

    #[test]
    fn from_detail_without_abilities_has_empty_ability() {
        let mut d = detail();
        d.abilities.clear();
        assert_eq!(RosterMember::from_detail(&d).ability, "");
    }

    #[test]
    fn add_rejects_duplicates_and_seventh_member() {
        let mut roster = Roster::new();
        for id in 1..=6 {
            roster.add(member(id, vec![Normal])).unwrap();
        }
        assert!(roster.is_full());
        assert_eq!(
            roster.add(member(3, vec![Normal])),
            Err(RosterError::Duplicate { pokemon_id: 3 })
        );
        assert_eq!(roster.add(member(7, vec![Normal])), Err(RosterError::Full));
        assert_eq!(roster.len(), 6);
    }

    #[test]
    fn remove_returns_member_and_keeps_order() {
        let mut roster = Roster::new();
        for id in [4, 7, 1] {
            roster.add(member(id, vec![Normal])).unwrap();
        }
        let removed = roster.remove(7).unwrap();
        assert_eq!(removed.pokemon_id, 7);
        let ids: Vec<u32> = roster.iter().map(|m| m.pokemon_id).collect();
        assert_eq!(ids, vec![4, 1]);
        assert_eq!(roster.remove(7), Err(RosterError::NotFound { pokemon_id: 7 }));
    }

    #[test]
    fn update_level_recomputes_stats() {
        let mut roster = Roster::new();
        roster.add(member(1, vec![Grass])).unwrap();
        let updated = roster
            .update(1, MemberUpdate { level: Some(50), ..Default::default() })
            .unwrap();
        assert_eq!(updated.level, 50);
        assert_eq!(updated.calculated_stats().get("hp"), Some(&(45 + 50 + 10)));
    }

    #[test]
    fn update_rejects_invalid_level_without_changes() {
        let mut roster = Roster::new();
        roster.add(member(1, vec![Grass])).unwrap();
        let err = roster
            .update(
                1,
                MemberUpdate {
                    level: Some(0),
                    ability: Some("chlorophyll".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, RosterError::InvalidLevel { level: 0 });
        assert_eq!(roster.get(1).unwrap().ability, "overgrow");

        let err = roster
            .update(1, MemberUpdate { level: Some(101), ..Default::default() })
            .unwrap_err();
        assert_eq!(err, RosterError::InvalidLevel { level: 101 });
    }

    #[test]
    fn update_moves_limits() {
        let mut roster = Roster::new();
        roster.add(member(1, vec![Grass])).unwrap();

        let five: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            roster.update(1, MemberUpdate { moves: Some(five), ..Default::default() }),
            Err(RosterError::TooManyMoves { count: 5 })
        );

        let dup = vec!["tackle".to_string(), "tackle".to_string()];
        assert_eq!(
            roster.update(1, MemberUpdate { moves: Some(dup), ..Default::default() }),
            Err(RosterError::DuplicateMove { name: "tackle".to_string() })
        );

        let ok = vec!["tackle".to_string(), "vine-whip".to_string()];
        roster
            .update(1, MemberUpdate { moves: Some(ok.clone()), ..Default::default() })
            .unwrap();
        assert_eq!(roster.get(1).unwrap().moves, ok);
    }

    #[test]
    fn update_sets_and_clears_held_item() {
        let mut roster = Roster::new();
        roster.add(member(1, vec![Grass])).unwrap();
        roster
            .update(
                1,
                MemberUpdate { held_item: Some(Some("leftovers".to_string())), ..Default::default() },
            )
            .unwrap();
        assert_eq!(roster.get(1).unwrap().held_item.as_deref(), Some("leftovers"));

        roster
            .update(1, MemberUpdate { held_item: Some(None), ..Default::default() })
            .unwrap();
        assert!(roster.get(1).unwrap().held_item.is_none());
    }

    #[test]
    fn update_missing_member() {
        let mut roster = Roster::new();
        assert_eq!(
            roster.update(9, MemberUpdate::default()).unwrap_err(),
            RosterError::NotFound { pokemon_id: 9 }
        );
    }

    #[test]
    fn from_members_enforces_rules() {
        let members: Vec<RosterMember> = (1..=7).map(|id| member(id, vec![Normal])).collect();
        assert_eq!(Roster::from_members(members), Err(RosterError::Full));
    }

    #[test]
    fn team_weaknesses_counts_members() {
        let chart = TypeChart::builtin();
        let mut roster = Roster::new();
        roster.add(member(6, vec![Fire, Flying])).unwrap(); // charizard
        roster.add(member(9, vec![Water])).unwrap(); // blastoise
        roster.add(member(25, vec![Electric])).unwrap(); // pikachu

        let w = TeamWeaknesses::compute(&roster, &chart);
        assert_eq!(w.count(Electric), 2); // charizard, blastoise
        assert_eq!(w.count(Rock), 1);
        // Fire's weakness counts for charizard even though flying is immune.
        assert_eq!(w.count(Ground), 2);
        assert_eq!(w.count(Ice), 1);
        assert_eq!(w.count(Fire), 0);

        let sorted = w.sorted();
        assert_eq!(sorted[0], (Electric, 2));
        assert_eq!(sorted[1], (Ground, 2));
        assert_eq!(w.shared(2), vec![Electric, Ground]);
    }

    #[test]
    fn team_weaknesses_count_each_member_once() {
        let chart = TypeChart::builtin();
        let mut roster = Roster::new();
        // Rock is doubled by both of geodude's types but counts once.
        roster.add(member(74, vec![Rock, Ground])).unwrap();
        let w = TeamWeaknesses::compute(&roster, &chart);
        assert_eq!(w.count(Water), 1);
        assert_eq!(w.count(Grass), 1);
        assert_eq!(w.shared(2), Vec::<PokemonType>::new());
    }

    #[test]
    fn team_weaknesses_empty_roster() {
        let w = TeamWeaknesses::compute(&Roster::new(), &TypeChart::builtin());
        assert!(w.is_empty());
        assert!(w.sorted().is_empty());
    }
}
