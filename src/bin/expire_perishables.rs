//! Expiry sweep, meant to run from cron.
//!
//! Finds every perishable batch past its computed expiration, records a
//! loss for the remaining quantity, and retires the batch. Safe to run
//! concurrently with the API server and idempotent across runs.

use clap::Parser;
use tracing::{error, info};

use brigade_api as api;

#[derive(Parser, Debug)]
#[command(name = "expire-perishables", about = "Sweep expired perishable batches into losses")]
struct Args {
    /// Database URL; APP__DATABASE_URL or config files when omitted
    #[arg(long)]
    database_url: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();
    api::config::init_tracing(&args.log_level, false);

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
        Ok(db) => std::sync::Arc::new(db),
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    let (tx, rx) = tokio::sync::mpsc::channel(64);
    tokio::spawn(api::events::process_events(rx));
    let sweeper = api::services::perishables::PerishableService::new(
        db,
        api::events::EventSender::new(tx),
    );

    match sweeper.sweep_expired().await {
        Ok(outcome) => {
            info!(
                "Sweep finished: {} examined, {} expired, {} losses recorded, {} failures",
                outcome.examined, outcome.expired, outcome.losses_recorded, outcome.failures
            );
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Sweep failed: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
