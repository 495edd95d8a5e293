// Type chart: damage multipliers between elemental types, and the
// weakness / resistance / immunity sets derived from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::PokemonType;

const TYPE_COUNT: usize = PokemonType::ALL.len();

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("damage relations for `{name}` were supplied more than once")]
    DuplicateDefender { name: String },
}

/// Damage relations of a single defending type, as the species API publishes
/// them. Names are kept as received; unknown names are ignored when a chart
/// is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRelations {
    pub name: String,
    pub double_damage_from: Vec<String>,
    pub half_damage_from: Vec<String>,
    pub no_damage_from: Vec<String>,
}

/// Weaknesses, resistances and immunities of one creature, each in type
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageRelations {
    pub weaknesses: Vec<PokemonType>,
    pub resistances: Vec<PokemonType>,
    pub immunities: Vec<PokemonType>,
}

/// Multiplier table indexed `[attacking][defending]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeChart {
    table: [[f32; TYPE_COUNT]; TYPE_COUNT],
}

impl Default for TypeChart {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TypeChart {
    /// A chart where every matchup is neutral.
    fn neutral() -> Self {
        TypeChart {
            table: [[1.0; TYPE_COUNT]; TYPE_COUNT],
        }
    }

    /// The current-generation chart.
    pub fn builtin() -> Self {
        use PokemonType::*;

        // (attacking, super effective against, not very effective against, no effect against)
        let rows: [(PokemonType, &[PokemonType], &[PokemonType], &[PokemonType]); TYPE_COUNT] = [
            (Normal, &[], &[Rock, Steel], &[Ghost]),
            (Fire, &[Grass, Ice, Bug, Steel], &[Fire, Water, Rock, Dragon], &[]),
            (Water, &[Fire, Ground, Rock], &[Water, Grass, Dragon], &[]),
            (Electric, &[Water, Flying], &[Electric, Grass, Dragon], &[Ground]),
            (
                Grass,
                &[Water, Ground, Rock],
                &[Fire, Grass, Poison, Flying, Bug, Dragon, Steel],
                &[],
            ),
            (Ice, &[Grass, Ground, Flying, Dragon], &[Fire, Water, Ice, Steel], &[]),
            (
                Fighting,
                &[Normal, Ice, Rock, Dark, Steel],
                &[Poison, Flying, Psychic, Bug, Fairy],
                &[Ghost],
            ),
            (Poison, &[Grass, Fairy], &[Poison, Ground, Rock, Ghost], &[Steel]),
            (Ground, &[Fire, Electric, Poison, Rock, Steel], &[Grass, Bug], &[Flying]),
            (Flying, &[Grass, Fighting, Bug], &[Electric, Rock, Steel], &[]),
            (Psychic, &[Fighting, Poison], &[Psychic, Steel], &[Dark]),
            (
                Bug,
                &[Grass, Psychic, Dark],
                &[Fire, Fighting, Poison, Flying, Ghost, Steel, Fairy],
                &[],
            ),
            (Rock, &[Fire, Ice, Flying, Bug], &[Fighting, Ground, Steel], &[]),
            (Ghost, &[Psychic, Ghost], &[Dark], &[Normal]),
            (Dragon, &[Dragon], &[Steel], &[Fairy]),
            (Dark, &[Psychic, Ghost], &[Fighting, Dark, Fairy], &[]),
            (Steel, &[Ice, Rock, Fairy], &[Fire, Water, Electric, Steel], &[]),
            (Fairy, &[Fighting, Dragon, Dark], &[Fire, Poison, Steel], &[]),
        ];

        let mut chart = Self::neutral();
        for (attacking, double, half, none) in rows {
            let row = &mut chart.table[attacking.index()];
            for d in double {
                row[d.index()] = 2.0;
            }
            for d in half {
                row[d.index()] = 0.5;
            }
            for d in none {
                row[d.index()] = 0.0;
            }
        }
        chart
    }

    /// Build a chart from defending-side relations. Pairs that no relation
    /// mentions stay neutral.
    pub fn from_relations(relations: &[TypeRelations]) -> Result<Self, ChartError> {
        let mut chart = Self::neutral();
        let mut seen = [false; TYPE_COUNT];

        for rel in relations {
            let Some(defending) = PokemonType::from_name(&rel.name) else {
                continue;
            };
            if seen[defending.index()] {
                return Err(ChartError::DuplicateDefender {
                    name: rel.name.clone(),
                });
            }
            seen[defending.index()] = true;

            let groups: [(&[String], f32); 3] = [
                (&rel.double_damage_from, 2.0),
                (&rel.half_damage_from, 0.5),
                (&rel.no_damage_from, 0.0),
            ];
            for (names, value) in groups {
                for attacking in names.iter().filter_map(|n| PokemonType::from_name(n)) {
                    chart.table[attacking.index()][defending.index()] = value;
                }
            }
        }

        Ok(chart)
    }

    pub fn multiplier(&self, attacking: PokemonType, defending: PokemonType) -> f32 {
        self.table[attacking.index()][defending.index()]
    }

    /// Combined multiplier against a creature with one or more types.
    /// Repeated defending types count once.
    pub fn multiplier_against(&self, attacking: PokemonType, defending: &[PokemonType]) -> f32 {
        let mut seen = [false; TYPE_COUNT];
        let mut product = 1.0;
        for d in defending {
            if !std::mem::replace(&mut seen[d.index()], true) {
                product *= self.multiplier(attacking, *d);
            }
        }
        product
    }

    /// Union of the single-type relations of every defending type. An
    /// attacking type lands in each list that any one defending type puts it
    /// in, so the lists can overlap on dual types.
    pub fn damage_relations(&self, defending: &[PokemonType]) -> DamageRelations {
        let mut relations = DamageRelations::default();
        for attacking in PokemonType::ALL {
            let hits = |pred: fn(f32) -> bool| {
                defending.iter().any(|d| pred(self.multiplier(attacking, *d)))
            };
            if hits(|m| m > 1.0) {
                relations.weaknesses.push(attacking);
            }
            if hits(|m| m > 0.0 && m < 1.0) {
                relations.resistances.push(attacking);
            }
            if hits(|m| m == 0.0) {
                relations.immunities.push(attacking);
            }
        }
        relations
    }

    /// Classify every attacking type by its combined multiplier. Unlike
    /// `damage_relations` the three lists never share a type.
    pub fn effective_relations(&self, defending: &[PokemonType]) -> DamageRelations {
        let mut relations = DamageRelations::default();
        if defending.is_empty() {
            return relations;
        }

        for attacking in PokemonType::ALL {
            let m = self.multiplier_against(attacking, defending);
            if m == 0.0 {
                relations.immunities.push(attacking);
            } else if m > 1.0 {
                relations.weaknesses.push(attacking);
            } else if m < 1.0 {
                relations.resistances.push(attacking);
            }
        }
        relations
    }

    /// Attacking types that deal double damage to a single defending type.
    pub fn super_effective_against(&self, defending: PokemonType) -> Vec<PokemonType> {
        PokemonType::ALL
            .into_iter()
            .filter(|a| self.multiplier(*a, defending) > 1.0)
            .collect()
    }

    /// Attacking types that a single defending type resists or is immune to.
    pub fn resisted_by(&self, defending: PokemonType) -> Vec<PokemonType> {
        PokemonType::ALL
            .into_iter()
            .filter(|a| self.multiplier(*a, defending) < 1.0)
            .collect()
    }
}
