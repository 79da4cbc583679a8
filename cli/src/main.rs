//! supplywatch CLI
//!
//! ```text
//! supplywatch [START_LEDGER] [--mode stream|historical] [--end-ledger N]
//!             [--asset-code CODE --asset-issuer G...] [--network testnet]
//!             [--horizon-url URL] [--output console|json]
//! ```
//!
//! Every flag also reads from its environment variable (`HORIZON_URL`,
//! `ASSET_CODE`, `START_LEDGER`, ...). Ctrl-C stops the monitor cleanly.

mod config;
mod output;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use supplywatch_core::SupplyReporter;

use crate::config::{Config, OutputFormat};
use crate::output::{ConsoleReporter, JsonLinesReporter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    telemetry::init_tracing(&config.log_config());

    let reporter: Box<dyn SupplyReporter> = match config.output {
        OutputFormat::Console => Box::new(ConsoleReporter::stdout()),
        OutputFormat::Json => Box::new(JsonLinesReporter::stdout()),
    };

    let shutdown = CancellationToken::new();
    let mut monitor = config
        .builder()?
        .build(reporter, shutdown.clone())
        .context("failed to set up monitor")?;

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupt received, shutting down");
                shutdown.cancel();
            }
            Err(e) => tracing::error!(error = %e, "unable to listen for ctrl-c"),
        }
    });

    let outcome = monitor.run().await;
    tracing::info!(
        ledgers = outcome.ledgers_processed,
        last_ledger = ?outcome.last_ledger,
        supply = %outcome.supply.formatted,
        mints = outcome.supply.stats.mints,
        burns = outcome.supply.stats.burns,
        clawbacks = outcome.supply.stats.clawbacks,
        "monitor stopped"
    );
    Ok(())
}
