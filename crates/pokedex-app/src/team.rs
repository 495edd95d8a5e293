// Per-user roster management and gym matchups.
//
// Every mutation loads the user's roster, applies the change through the
// `Roster` rules and saves it back before returning, so the store always
// holds the latest state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use pokedex_core::gym::{find_leader, kanto_leaders, GymLeader, Matchup};
use pokedex_core::pokemon::PokemonDetail;
use pokedex_core::roster::{
    calculate_stats, MemberUpdate, Roster, RosterError, RosterMember, TeamWeaknesses,
};
use pokedex_core::store::RosterStore;
use pokedex_core::type_chart::TypeChart;
use pokedex_core::types::PokemonType;

use crate::error::{AppError, AppResult};
use crate::pokedex::Pokedex;

/// One creature on a gym leader's team, with stats at its level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderMemberView {
    pub pokemon_id: u32,
    pub name: String,
    pub image_url: String,
    pub types: Vec<PokemonType>,
    pub level: u8,
    pub stats: BTreeMap<String, u32>,
}

#[derive(Debug, Clone)]
pub struct GymReport {
    pub leader: GymLeader,
    pub team: Vec<LeaderMemberView>,
    pub matchup: Matchup,
}

pub struct TeamService {
    pokedex: Arc<Pokedex>,
    store: Arc<dyn RosterStore>,
    chart: TypeChart,
}

impl TeamService {
    pub fn new(pokedex: Arc<Pokedex>, store: Arc<dyn RosterStore>, chart: TypeChart) -> Self {
        Self {
            pokedex,
            store,
            chart,
        }
    }

    pub fn roster(&self, user_id: &str) -> AppResult<Roster> {
        self.store.load_roster(user_id).map_err(AppError::Storage)
    }

    fn save(&self, user_id: &str, roster: &Roster) -> AppResult<()> {
        self.store.save_roster(user_id, roster).map_err(AppError::Storage)
    }

    /// Add a creature at the default level with its first ability. Roster
    /// rules are checked before any detail is fetched.
    pub async fn add(&self, user_id: &str, pokemon_id: u32) -> AppResult<RosterMember> {
        let mut roster = self.roster(user_id)?;
        if roster.contains(pokemon_id) {
            return Err(RosterError::Duplicate { pokemon_id }.into());
        }
        if roster.is_full() {
            return Err(RosterError::Full.into());
        }

        let detail = self.pokedex.get_pokemon(pokemon_id).await?;
        let member = RosterMember::from_detail(&detail);
        roster.add(member.clone())?;
        self.save(user_id, &roster)?;

        info!(user_id, pokemon_id, size = roster.len(), "added to roster");
        Ok(member)
    }

    pub fn remove(&self, user_id: &str, pokemon_id: u32) -> AppResult<RosterMember> {
        let mut roster = self.roster(user_id)?;
        let removed = roster.remove(pokemon_id)?;
        self.save(user_id, &roster)?;

        info!(user_id, pokemon_id, size = roster.len(), "removed from roster");
        Ok(removed)
    }

    pub fn update(
        &self,
        user_id: &str,
        pokemon_id: u32,
        update: MemberUpdate,
    ) -> AppResult<RosterMember> {
        let mut roster = self.roster(user_id)?;
        let updated = roster.update(pokemon_id, update)?.clone();
        self.save(user_id, &roster)?;

        info!(user_id, pokemon_id, level = updated.level, "roster member updated");
        Ok(updated)
    }

    pub fn weaknesses(&self, user_id: &str) -> AppResult<TeamWeaknesses> {
        let roster = self.roster(user_id)?;
        Ok(TeamWeaknesses::compute(&roster, &self.chart))
    }

    pub fn leaders(&self) -> Vec<GymLeader> {
        kanto_leaders()
    }

    /// The user's roster against one gym leader. Each distinct creature on
    /// the leader's team is looked up once through the species cache.
    pub async fn gym_matchup(&self, user_id: &str, leader_id: &str) -> AppResult<GymReport> {
        let leader = find_leader(leader_id).ok_or_else(|| AppError::UnknownLeader {
            id: leader_id.to_string(),
        })?;
        let roster = self.roster(user_id)?;

        let mut details: HashMap<u32, PokemonDetail> = HashMap::new();
        for id in leader.distinct_pokemon_ids() {
            let detail = self.pokedex.get_pokemon(id).await?;
            details.insert(id, detail);
        }

        let team: Vec<LeaderMemberView> = leader
            .team
            .iter()
            .filter_map(|p| {
                details.get(&p.pokemon_id).map(|d| LeaderMemberView {
                    pokemon_id: d.id,
                    name: d.name.clone(),
                    image_url: d.image_url.clone(),
                    types: d.types.clone(),
                    level: p.level,
                    stats: calculate_stats(&d.base_stat_map(), p.level),
                })
            })
            .collect();

        let leader_types: Vec<PokemonType> =
            team.iter().flat_map(|m| m.types.iter().copied()).collect();
        let matchup = Matchup::evaluate(&self.chart, &roster, &leader_types);

        Ok(GymReport {
            leader,
            team,
            matchup,
        })
    }
}
