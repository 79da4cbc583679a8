//! Fluent builder API for creating supply monitors.
//!
//! # Example
//!
//! ```rust,no_run
//! use supplywatch_stellar::{MonitorBuilder, Network};
//! use supplywatch_core::{MemoryReporter, MonitorMode};
//! use tokio_util::sync::CancellationToken;
//!
//! let monitor = MonitorBuilder::new()
//!     .horizon_url("https://horizon-testnet.stellar.org")
//!     .network(Network::Testnet)
//!     .asset("fifo:GC66GVXUBUONBFLHFA7QBB2RU7HK3XT5AYM5ZZSIIG2XCYDGHXRDKUKE")
//!     .mode(MonitorMode::Historical)
//!     .start_ledger(593_231)
//!     .build(Box::new(MemoryReporter::new()), CancellationToken::new())
//!     .unwrap();
//! ```

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use supplywatch_core::config::{MonitorConfig, MonitorMode};
use supplywatch_core::error::{ConfigError, FeedError};
use supplywatch_core::handler::SupplyReporter;

use crate::asset::{AssetError, AssetIdentity, Network};
use crate::fetcher::LedgerFeed;
use crate::horizon::{HorizonClient, HorizonConfig};
use crate::index_loop::MonitorLoop;
use crate::processor::EventProcessor;

/// Default Horizon endpoint (a local quickstart node).
pub const DEFAULT_HORIZON_URL: &str = "http://stellar.orb.local:8000";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Fluent builder for a [`MonitorLoop`].
#[derive(Debug, Clone)]
pub struct MonitorBuilder {
    config: MonitorConfig,
    horizon_url: String,
    horizon: HorizonConfig,
    network: Network,
    asset: Option<String>,
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorBuilder {
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
            horizon_url: DEFAULT_HORIZON_URL.to_string(),
            horizon: HorizonConfig::default(),
            network: Network::Testnet,
            asset: None,
        }
    }

    /// Set the Horizon base URL.
    pub fn horizon_url(mut self, url: impl Into<String>) -> Self {
        self.horizon_url = url.into();
        self
    }

    pub fn network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Set the monitored asset as a `CODE:ISSUER` descriptor.
    pub fn asset(mut self, descriptor: impl Into<String>) -> Self {
        self.asset = Some(descriptor.into());
        self
    }

    pub fn mode(mut self, mode: MonitorMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn start_ledger(mut self, sequence: u64) -> Self {
        self.config.start_ledger = Some(sequence);
        self
    }

    /// Stop after this ledger (historical mode only).
    pub fn end_ledger(mut self, sequence: u64) -> Self {
        self.config.end_ledger = Some(sequence);
        self
    }

    /// Pause after each processed ledger, in milliseconds.
    pub fn ledger_delay_ms(mut self, ms: u64) -> Self {
        self.config.ledger_delay_ms = ms;
        self
    }

    /// Pause after a failed fetch, in milliseconds.
    pub fn error_delay_ms(mut self, ms: u64) -> Self {
        self.config.error_delay_ms = ms;
        self
    }

    pub fn stream_buffer(mut self, capacity: usize) -> Self {
        self.config.stream_buffer = capacity;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.horizon.request_timeout = timeout;
        self
    }

    /// Build the `MonitorConfig`.
    pub fn build_config(&self) -> MonitorConfig {
        self.config.clone()
    }

    /// Validate, derive the asset's contract id and wire a Horizon-backed monitor.
    pub fn build(
        self,
        reporter: Box<dyn SupplyReporter>,
        shutdown: CancellationToken,
    ) -> Result<MonitorLoop<HorizonClient>, BuildError> {
        let feed = HorizonClient::new(self.horizon_url.clone(), self.horizon.clone())?;
        self.build_with_feed(Arc::new(feed), reporter, shutdown)
    }

    /// Like [`build`](Self::build) with a caller-supplied feed.
    pub fn build_with_feed<F: LedgerFeed + 'static>(
        self,
        feed: Arc<F>,
        reporter: Box<dyn SupplyReporter>,
        shutdown: CancellationToken,
    ) -> Result<MonitorLoop<F>, BuildError> {
        self.config.validate()?;
        let descriptor = self.asset.ok_or(ConfigError::Missing("asset"))?;
        let asset = AssetIdentity::parse(&descriptor)?;
        let processor = EventProcessor::new(asset, &self.network)?;

        Ok(
            MonitorLoop::new(self.config, feed, processor, reporter, shutdown)
                .describe(self.horizon_url, self.network.passphrase()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFeed;
    use supplywatch_core::handler::MemoryReporter;

    const FIFO: &str = "fifo:GC66GVXUBUONBFLHFA7QBB2RU7HK3XT5AYM5ZZSIIG2XCYDGHXRDKUKE";

    #[test]
    fn builder_defaults() {
        let cfg = MonitorBuilder::new().build_config();
        assert_eq!(cfg.mode, MonitorMode::Streaming);
        assert_eq!(cfg.ledger_delay_ms, 200);
        assert_eq!(cfg.error_delay_ms, 1000);
        assert_eq!(cfg.start_ledger, None);
    }

    #[test]
    fn builder_custom() {
        let cfg = MonitorBuilder::new()
            .mode(MonitorMode::Historical)
            .start_ledger(100)
            .end_ledger(200)
            .ledger_delay_ms(0)
            .error_delay_ms(50)
            .build_config();

        assert_eq!(cfg.mode, MonitorMode::Historical);
        assert_eq!(cfg.start_ledger, Some(100));
        assert_eq!(cfg.end_ledger, Some(200));
        assert_eq!(cfg.error_delay_ms, 50);
    }

    #[test]
    fn build_requires_asset() {
        let err = MonitorBuilder::new()
            .build_with_feed(
                Arc::new(MemoryFeed::new()),
                Box::new(MemoryReporter::new()),
                CancellationToken::new(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, BuildError::Config(ConfigError::Missing("asset"))));
    }

    #[test]
    fn build_rejects_bad_asset() {
        let err = MonitorBuilder::new()
            .asset("nocolon")
            .build_with_feed(
                Arc::new(MemoryFeed::new()),
                Box::new(MemoryReporter::new()),
                CancellationToken::new(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, BuildError::Asset(_)));
    }

    #[test]
    fn build_derives_contract_id() {
        let monitor = MonitorBuilder::new()
            .asset(FIFO)
            .network(Network::Testnet)
            .build_with_feed(
                Arc::new(MemoryFeed::new()),
                Box::new(MemoryReporter::new()),
                CancellationToken::new(),
            )
            .unwrap();
        assert_eq!(
            monitor.processor().contract_strkey(),
            "CDWZDP4EYF75ZV6EEMDJJTJNK3TWNMLE6TGTVBIA3HS4BJUIRHJ3MLMG"
        );
    }
}
