//! Command-line and environment configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use supplywatch_core::MonitorMode;
use supplywatch_stellar::{MonitorBuilder, Network, DEFAULT_HORIZON_URL};

use crate::telemetry::LogConfig;

/// Reporter output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, coloured lines.
    Console,
    /// One JSON object per line.
    Json,
}

/// Track the circulating supply of a Stellar classic asset from its
/// contract's mint, burn and clawback events.
#[derive(Parser, Debug)]
#[command(name = "supplywatch", version)]
pub struct Config {
    /// Ledger to start from. Streaming resumes after it; historical
    /// replay starts at it. Defaults to the latest ledger.
    #[arg(env = "START_LEDGER")]
    pub start_ledger: Option<u64>,

    /// Horizon base URL
    #[arg(long, env = "HORIZON_URL", default_value = DEFAULT_HORIZON_URL)]
    pub horizon_url: String,

    /// Network: testnet, pubnet, futurenet or a passphrase
    #[arg(long, env = "STELLAR_NETWORK", default_value = "testnet")]
    pub network: Network,

    /// Explicit network passphrase (overrides --network)
    #[arg(long, env = "NETWORK_PASSPHRASE")]
    pub network_passphrase: Option<String>,

    /// Asset code
    #[arg(long, env = "ASSET_CODE", default_value = "fifo")]
    pub asset_code: String,

    /// Asset issuer account (G...)
    #[arg(
        long,
        env = "ASSET_ISSUER",
        default_value = "GC66GVXUBUONBFLHFA7QBB2RU7HK3XT5AYM5ZZSIIG2XCYDGHXRDKUKE"
    )]
    pub asset_issuer: String,

    /// Traversal mode: stream or historical
    #[arg(long, env = "MONITOR_MODE", default_value = "stream")]
    pub mode: MonitorMode,

    /// Last ledger to process (historical mode only)
    #[arg(long, env = "END_LEDGER")]
    pub end_ledger: Option<u64>,

    /// Pause after each processed ledger, in milliseconds
    #[arg(long, env = "LEDGER_DELAY_MS", default_value_t = 200)]
    pub ledger_delay_ms: u64,

    /// Pause after a failed fetch, in milliseconds
    #[arg(long, env = "ERROR_DELAY_MS", default_value_t = 1000)]
    pub error_delay_ms: u64,

    /// Horizon request timeout, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Output format
    #[arg(long, env = "OUTPUT", value_enum, default_value = "console")]
    pub output: OutputFormat,

    /// Log level or filter directives
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    pub fn network(&self) -> Network {
        match &self.network_passphrase {
            Some(p) => p.parse::<Network>().unwrap_or_else(|never| match never {}),
            None => self.network.clone(),
        }
    }

    pub fn asset_descriptor(&self) -> String {
        format!("{}:{}", self.asset_code, self.asset_issuer)
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            json: self.log_json,
        }
    }

    /// Translate into a monitor builder. Fails on out-of-range values.
    pub fn builder(&self) -> Result<MonitorBuilder> {
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }

        let mut builder = MonitorBuilder::new()
            .horizon_url(self.horizon_url.clone())
            .network(self.network())
            .asset(self.asset_descriptor())
            .mode(self.mode)
            .ledger_delay_ms(self.ledger_delay_ms)
            .error_delay_ms(self.error_delay_ms)
            .request_timeout(Duration::from_secs(self.request_timeout_secs));
        if let Some(start) = self.start_ledger {
            builder = builder.start_ledger(start);
        }
        if let Some(end) = self.end_ledger {
            builder = builder.end_ledger(end);
        }

        builder
            .build_config()
            .validate()
            .context("invalid monitor configuration")?;
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("supplywatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn positional_start_ledger() {
        let cfg = parse(&["593231", "--mode", "historical"]);
        assert_eq!(cfg.start_ledger, Some(593_231));
        assert_eq!(cfg.mode, MonitorMode::Historical);
    }

    #[test]
    fn passphrase_overrides_network() {
        let cfg = parse(&[
            "--network",
            "testnet",
            "--network-passphrase",
            "Public Global Stellar Network ; September 2015",
        ]);
        assert_eq!(cfg.network(), Network::Pubnet);
    }

    #[test]
    fn builder_rejects_end_before_start() {
        let cfg = parse(&["10", "--mode", "historical", "--end-ledger", "5"]);
        assert!(cfg.builder().is_err());
    }

    #[test]
    fn rejects_unknown_mode() {
        let res = Config::try_parse_from(["supplywatch", "--mode", "sideways"]);
        assert!(res.is_err());
    }

    #[test]
    fn descriptor_joins_code_and_issuer() {
        let cfg = parse(&["--asset-code", "USDC", "--asset-issuer", "GISSUER"]);
        assert_eq!(cfg.asset_descriptor(), "USDC:GISSUER");
        assert_eq!(cfg.output, OutputFormat::Console);
    }
}
