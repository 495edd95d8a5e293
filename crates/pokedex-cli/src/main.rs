// Pokédex entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (log to file, stdout carries command output)
// 3. Load config
// 4. Open database
// 5. Build services and run the command

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use pokedex_cli::cli::Cli;
use pokedex_cli::commands::{execute, Services};
use pokedex_core::config;
use pokedex_core::db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse arguments
    let cli = Cli::parse();

    // 2. Initialize tracing
    init_tracing()?;
    info!("pokedex starting: {:?}", cli.command);

    // 3. Load config
    let config = config::load_config().context("failed to load configuration")?;

    // 4. Open database
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db = Database::open(&db_path).context("failed to open database")?;
    info!("Database opened at {}", db_path.display());

    // 5. Run the command
    let services = Services::new(config, db)?;
    let user_id = services.user_id(cli.user.as_deref()).to_string();

    match execute(&services, &user_id, cli.command).await {
        Ok(output) => {
            print!("{output}");
            Ok(())
        }
        Err(e) => {
            error!("command failed: {e:#}");
            Err(e)
        }
    }
}

/// Initialize tracing to log to a file so stdout only carries command output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("pokedex.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pokedex=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
