use std::{process::ExitCode, time::Duration};

use clap::Parser;
use tracing::{debug, info, warn};
use tracker::{cli::Cli, commands, db::create_pool, service::Tracker, *};

#[tokio::main]
async fn main() -> Result<ExitCode, anyhow::Error> {
    load_dotenv()?;
    configure_tracing()?;

    let args = Cli::parse();
    debug!(?args);

    // Run the migrations synchronously before creating the pool
    let ran = domain::db::run_migrations(&args.sqlite_connection_string)?;
    info!("Ran {ran} db migrations");

    let pool = create_pool(
        &args.sqlite_connection_string,
        args.pool_size,
        Duration::from_millis(args.busy_timeout_ms),
    )?;
    let tracker = Tracker::new(pool);

    match commands::run(&tracker, &args).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!(%e, "Command failed");
            eprintln!("{}", serde_json::to_string_pretty(&e.to_json())?);
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}
