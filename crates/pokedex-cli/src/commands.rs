// Wiring of services and dispatch of parsed commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use pokedex_api::PokeApiClient;
use pokedex_app::{pokedex::load_type_chart, Pokedex, TeamService};
use pokedex_core::config::Config;
use pokedex_core::db::Database;

use crate::cli::{member_update, Command, TeamCommand};
use crate::render;

/// Everything a command needs, built once per invocation.
pub struct Services {
    pub config: Config,
    pub db: Arc<Database>,
    pub client: Arc<PokeApiClient>,
    pub pokedex: Arc<Pokedex>,
    pub team: TeamService,
}

impl Services {
    /// Build the client and services on top of an open database. The type
    /// chart is the synced one when present, otherwise the builtin.
    pub fn new(config: Config, db: Database) -> anyhow::Result<Self> {
        let db = Arc::new(db);
        let chart = load_type_chart(db.as_ref());
        let client = Arc::new(
            PokeApiClient::from_config(&config, chart.clone())
                .context("failed to build species API client")?,
        );
        let pokedex = Arc::new(Pokedex::new(client.clone(), db.clone(), config.pokedex.limit));
        let team = TeamService::new(pokedex.clone(), db.clone(), chart);

        Ok(Self {
            config,
            db,
            client,
            pokedex,
            team,
        })
    }

    /// Roster owner: the `--user` flag, else the configured profile.
    pub fn user_id<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(self.config.profile.user_id.as_str())
    }
}

/// Run one command and return the text to print.
pub async fn execute(services: &Services, user_id: &str, command: Command) -> anyhow::Result<String> {
    let out = match command {
        Command::List {
            limit,
            search,
            pokemon_type,
            csv,
        } => {
            let entries = services
                .pokedex
                .search(limit, search.as_deref().unwrap_or(""), pokemon_type)
                .await?;
            if csv {
                render::listing_csv(&entries)?
            } else {
                render::listing(&entries)
            }
        }
        Command::Show { id } => render::detail(&services.pokedex.get_pokemon(id).await?),
        Command::Team { command } => team(services, user_id, command).await?,
        Command::Gyms => render::leaders(&services.team.leaders()),
        Command::Gym { leader } => {
            render::gym_report(&services.team.gym_matchup(user_id, &leader).await?)
        }
        Command::Items => {
            let items = services
                .client
                .list_held_items(&services.config.items.categories)
                .await;
            render::items(&items)
        }
        Command::Seed { from, to } => {
            let to = to.unwrap_or(services.config.pokedex.limit);
            anyhow::ensure!(from >= 1 && from <= to, "invalid seed range {from}..={to}");
            let delay = Duration::from_millis(services.config.api.request_delay_ms);
            info!(from, to, "seeding species cache");
            let report = services.pokedex.seed(from..=to, delay).await;
            render::seed_report(&report, services.db.cached_species_count()?)
        }
        Command::SyncTypes => {
            services.pokedex.sync_type_chart().await?;
            "Type chart synced and species cache cleared. It is used from the next run on.\n".to_string()
        }
    };
    Ok(out)
}

async fn team(services: &Services, user_id: &str, command: TeamCommand) -> anyhow::Result<String> {
    let team = &services.team;
    let out = match command {
        TeamCommand::Show => render::roster(&team.roster(user_id)?),
        TeamCommand::Add { id } => {
            let member = team.add(user_id, id).await?;
            format!("Added {}.\n{}", member.name, render::member(&member))
        }
        TeamCommand::Remove { id } => {
            let member = team.remove(user_id, id)?;
            format!("Removed {}.\n", member.name)
        }
        TeamCommand::Set {
            id,
            level,
            ability,
            item,
            clear_item,
            moves,
        } => {
            let update = member_update(level, ability, item, clear_item, moves);
            anyhow::ensure!(!update.is_empty(), "nothing to change for #{id}");
            render::member(&team.update(user_id, id, update)?)
        }
        TeamCommand::Weaknesses => render::weaknesses(&team.weaknesses(user_id)?),
    };
    Ok(out)
}
