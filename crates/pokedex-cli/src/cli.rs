// Command-line surface.

use clap::{Parser, Subcommand};

use pokedex_core::roster::MemberUpdate;
use pokedex_core::types::PokemonType;

#[derive(Debug, Parser)]
#[command(name = "pokedex")]
#[command(about = "Browse Kanto creatures, build a roster and check it against gym leaders")]
pub struct Cli {
    /// Roster owner. Defaults to `profile.user_id` from the config file.
    #[arg(long, global = true)]
    pub user: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List creatures, optionally filtered.
    List {
        #[arg(long)]
        limit: Option<u32>,
        /// Case-insensitive name fragment.
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "type", value_parser = parse_type)]
        pokemon_type: Option<PokemonType>,
        /// Write CSV instead of a table.
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Show full detail for one creature.
    Show { id: u32 },
    /// Manage your roster.
    Team {
        #[command(subcommand)]
        command: TeamCommand,
    },
    /// List the gym leaders.
    Gyms,
    /// Check your roster against a gym leader.
    Gym { leader: String },
    /// List items a creature can hold.
    Items,
    /// Fetch and cache detail records for a range of ids.
    Seed {
        #[arg(long, default_value_t = 1)]
        from: u32,
        /// Defaults to `pokedex.limit`.
        #[arg(long)]
        to: Option<u32>,
    },
    /// Rebuild the type chart from the species API.
    SyncTypes,
}

#[derive(Debug, Subcommand)]
pub enum TeamCommand {
    Show,
    Add {
        id: u32,
    },
    Remove {
        id: u32,
    },
    /// Edit a roster member.
    Set {
        id: u32,
        #[arg(long)]
        level: Option<u8>,
        #[arg(long)]
        ability: Option<String>,
        #[arg(long, conflicts_with = "clear_item")]
        item: Option<String>,
        #[arg(long, default_value_t = false)]
        clear_item: bool,
        /// Comma-separated, at most four.
        #[arg(long, value_delimiter = ',')]
        moves: Option<Vec<String>>,
    },
    /// Attacking types that hit several members super effectively.
    Weaknesses,
}

fn parse_type(s: &str) -> Result<PokemonType, String> {
    PokemonType::from_name(s).ok_or_else(|| format!("unknown type `{s}`"))
}

/// Build a partial edit from `team set` flags.
pub fn member_update(
    level: Option<u8>,
    ability: Option<String>,
    item: Option<String>,
    clear_item: bool,
    moves: Option<Vec<String>>,
) -> MemberUpdate {
    let held_item = if clear_item { Some(None) } else { item.map(Some) };
    MemberUpdate {
        level,
        ability,
        held_item,
        moves: moves.map(|m| {
            m.into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_flags_parse() {
        let cli = Cli::try_parse_from([
            "pokedex", "--user", "ash", "list", "--limit", "20", "--type", "Fire", "--csv",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("ash"));
        match cli.command {
            Command::List { limit, search, pokemon_type, csv } => {
                assert_eq!(limit, Some(20));
                assert!(search.is_none());
                assert_eq!(pokemon_type, Some(PokemonType::Fire));
                assert!(csv);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(Cli::try_parse_from(["pokedex", "list", "--type", "shadow"]).is_err());
    }

    #[test]
    fn user_flag_is_global() {
        let cli = Cli::try_parse_from(["pokedex", "team", "show", "--user", "misty"]).unwrap();
        assert_eq!(cli.user.as_deref(), Some("misty"));
    }

    #[test]
    fn team_set_builds_update() {
        let cli = Cli::try_parse_from([
            "pokedex", "team", "set", "25", "--level", "30", "--moves", "thunderbolt, quick-attack",
        ])
        .unwrap();
        let Command::Team {
            command: TeamCommand::Set { id, level, ability, item, clear_item, moves },
        } = cli.command
        else {
            panic!("expected team set");
        };
        assert_eq!(id, 25);
        let update = member_update(level, ability, item, clear_item, moves);
        assert_eq!(update.level, Some(30));
        assert_eq!(
            update.moves,
            Some(vec!["thunderbolt".to_string(), "quick-attack".to_string()])
        );
        assert!(update.held_item.is_none());
    }

    #[test]
    fn clear_item_and_item_conflict() {
        assert!(Cli::try_parse_from([
            "pokedex", "team", "set", "25", "--item", "leftovers", "--clear-item"
        ])
        .is_err());
    }

    #[test]
    fn clear_item_sets_explicit_none() {
        let update = member_update(None, None, None, true, None);
        assert_eq!(update.held_item, Some(None));
        let update = member_update(None, None, Some("leftovers".to_string()), false, None);
        assert_eq!(update.held_item, Some(Some("leftovers".to_string())));
        assert!(member_update(None, None, None, false, None).is_empty());
    }

    #[test]
    fn seed_defaults() {
        let cli = Cli::try_parse_from(["pokedex", "seed"]).unwrap();
        match cli.command {
            Command::Seed { from, to } => {
                assert_eq!(from, 1);
                assert!(to.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
