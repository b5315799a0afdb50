//! Database migration runner.

use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::error;

use brigade_api as api;
use brigade_api::migrator::Migrator;

#[derive(Parser, Debug)]
#[command(name = "migrate", about = "Run database migrations")]
struct Args {
    /// Database URL; APP__DATABASE_URL or config files when omitted
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply all pending migrations
    Up,
    /// Roll back the most recent migration
    Down {
        /// Number of migrations to roll back
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
    /// Drop everything and re-apply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();
    api::config::init_tracing("info", false);

    let database_url = match args.database_url {
        Some(url) => url,
        None => match api::config::load_config() {
            Ok(cfg) => cfg.database_url,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                return std::process::ExitCode::FAILURE;
            }
        },
    };

    let db = match api::db::establish_connection(&database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Command::Up => Migrator::up(&db, None).await,
        Command::Down { steps } => Migrator::down(&db, Some(steps)).await,
        Command::Status => Migrator::status(&db).await,
        Command::Fresh => Migrator::fresh(&db).await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("Migration command failed: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
