//! PBDW ETL - loads the warehouse once and exits

use anyhow::Result;
use clap::Parser;
use pbdw_common::logging::{init_logging, LogConfig, LogLevel};
use pbdw_etl::{config::Config, pipeline};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "pbdw-etl")]
#[command(author, version, about = "Load the Olist data set into the PBDW warehouse")]
struct Cli {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("pbdw-etl")
        .filter_directives("sqlx=warn,mongodb=warn")
        .build()
        .apply_env()?;

    let _log_guard = init_logging(&log_config)?;

    // Fatal errors end the run early but, like partial failures, still exit 0
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "Aborting ETL run");
            return Ok(());
        },
    };
    info!(
        postgres = %config.postgres.address(),
        mongo = %config.mongo.address(),
        input = %config.input.dir.display(),
        batch_size = config.batch_size,
        "Configuration loaded"
    );

    pipeline::finish(pipeline::run(&config).await);
    Ok(())
}
