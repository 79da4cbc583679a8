//! The monitor loop: drives historical replay or live streaming.
//!
//! # Historical
//! Walk sequence numbers from the start ledger (or the latest ledger, also
//! used when the feed no longer has the start ledger): fetch transactions → process → pause `ledger_delay` → next. A failed
//! fetch pauses `error_delay` and retries the same ledger.
//!
//! # Streaming
//! Resolve the start ledger to its paging token (falling back to `now`),
//! subscribe, and forward each notified sequence over a channel to the same
//! worker. The subscription is not reopened when it ends; the worker then
//! idles until shutdown.
//!
//! Every network call and pause is raced against the shutdown token. Events
//! are applied only after a ledger's transactions are fully fetched.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use supplywatch_core::config::{MonitorConfig, MonitorMode, MonitorState};
use supplywatch_core::cursor::StreamCursor;
use supplywatch_core::error::FeedError;
use supplywatch_core::handler::SupplyReporter;
use supplywatch_core::source::{ChannelSource, HistoricalSource, LedgerSource};
use supplywatch_core::supply::SupplySnapshot;
use supplywatch_core::types::{MonitorPhase, MonitorSummary};

use crate::fetcher::{LedgerFeed, TransactionRecord};
use crate::processor::EventProcessor;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOutcome {
    pub ledgers_processed: u64,
    pub last_ledger: Option<u64>,
    pub supply: SupplySnapshot,
}

/// Drives one monitoring mode until shutdown (or the end ledger).
pub struct MonitorLoop<F: LedgerFeed + 'static> {
    config: MonitorConfig,
    feed: Arc<F>,
    processor: EventProcessor,
    reporter: Box<dyn SupplyReporter>,
    shutdown: CancellationToken,
    feed_url: String,
    network: String,
    state: MonitorState,
    ledgers_processed: u64,
    last_ledger: Option<u64>,
}

impl<F: LedgerFeed + 'static> MonitorLoop<F> {
    pub fn new(
        config: MonitorConfig,
        feed: Arc<F>,
        processor: EventProcessor,
        reporter: Box<dyn SupplyReporter>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            feed,
            processor,
            reporter,
            shutdown,
            feed_url: String::new(),
            network: String::new(),
            state: MonitorState::Idle,
            ledgers_processed: 0,
            last_ledger: None,
        }
    }

    /// Labels reported once at startup.
    pub fn describe(mut self, feed_url: impl Into<String>, network: impl Into<String>) -> Self {
        self.feed_url = feed_url.into();
        self.network = network.into();
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn processor(&self) -> &EventProcessor {
        &self.processor
    }

    /// Run until the shutdown token fires, or until the end ledger in
    /// bounded historical mode.
    pub async fn run(&mut self) -> MonitorOutcome {
        self.state = MonitorState::Resolving;

        match self.config.mode {
            MonitorMode::Historical => {
                if let Some(start) = self.resolve_historical_start().await {
                    let mut source = HistoricalSource::new(start);
                    if let Some(end) = self.config.end_ledger {
                        source = source.until(end);
                    }
                    self.report_configuration(MonitorPhase::Historical, Some(start));
                    self.drive(&mut source).await;
                }
            }
            MonitorMode::Streaming => {
                let cursor = self.resolve_stream_cursor().await;
                self.report_configuration(MonitorPhase::Streaming, self.config.start_ledger);

                let (tx, mut source) = ChannelSource::channel(self.config.stream_buffer);
                let forwarder = tokio::spawn(forward_ledgers(
                    Arc::clone(&self.feed),
                    cursor,
                    tx,
                    self.shutdown.clone(),
                ));
                self.drive(&mut source).await;

                if !self.shutdown.is_cancelled() {
                    self.state = MonitorState::Draining;
                    tracing::warn!("ledger stream ended; idling until shutdown");
                    self.shutdown.cancelled().await;
                }
                forwarder.abort();
            }
        }

        self.state = MonitorState::Stopped;
        let outcome = MonitorOutcome {
            ledgers_processed: self.ledgers_processed,
            last_ledger: self.last_ledger,
            supply: self.processor.supply().snapshot(),
        };
        tracing::info!(
            ledgers = outcome.ledgers_processed,
            last = ?outcome.last_ledger,
            supply = %outcome.supply.formatted,
            "monitor stopped"
        );
        outcome
    }

    fn report_configuration(&mut self, phase: MonitorPhase, start_ledger: Option<u64>) {
        let summary = MonitorSummary {
            feed_url: self.feed_url.clone(),
            network: self.network.clone(),
            asset: self.processor.asset().canonical(),
            contract_id: self.processor.contract_strkey(),
            phase,
            start_ledger,
        };
        tracing::info!(
            asset = %summary.asset,
            contract = %summary.contract_id,
            mode = %self.config.mode,
            start = ?start_ledger,
            "monitor starting"
        );
        self.reporter.configuration(&summary);
    }

    /// Consume `source` until it is exhausted or shutdown fires.
    async fn drive(&mut self, source: &mut dyn LedgerSource) {
        self.state = MonitorState::Running;
        let phase = source.phase();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return,
                next = source.next_ledger() => next,
            };
            let Some(sequence) = next else {
                return;
            };

            let Some(transactions) = self.fetch_with_retry(sequence).await else {
                return;
            };
            self.processor
                .process_ledger(sequence, phase, &transactions, self.reporter.as_mut());
            source.processed(sequence);
            self.ledgers_processed += 1;
            self.last_ledger = Some(sequence);

            if !self.pause(self.config.ledger_delay()).await {
                return;
            }
        }
    }

    /// Fetch a ledger's transactions, retrying every `error_delay` until it
    /// succeeds. `None` on shutdown.
    async fn fetch_with_retry(&self, sequence: u64) -> Option<Vec<TransactionRecord>> {
        loop {
            let result = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return None,
                r = self.feed.transactions(sequence) => r,
            };
            match result {
                Ok(transactions) => return Some(transactions),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(ledger = sequence, "ledger not closed yet; waiting");
                }
                Err(e) => {
                    tracing::warn!(ledger = sequence, error = %e, "fetch failed; retrying");
                }
            }
            if !self.pause(self.config.error_delay()).await {
                return None;
            }
        }
    }

    /// Historical start: the configured ledger if the feed has it, else the
    /// feed's latest. A configured ledger beyond the tip is kept and waited for.
    async fn resolve_historical_start(&self) -> Option<u64> {
        if let Some(start) = self.config.start_ledger {
            let result = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return None,
                r = self.feed.ledger(start) => r,
            };
            match result {
                Ok(_) => return Some(start),
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    tracing::warn!(ledger = start, error = %e, "could not check start ledger; using it as given");
                    return Some(start);
                }
            }
        }
        loop {
            let result = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return None,
                r = self.feed.latest_ledger() => r,
            };
            match result {
                Ok(latest) => {
                    return Some(match self.config.start_ledger {
                        Some(start) if start > latest.sequence => {
                            tracing::info!(
                                ledger = start,
                                latest = latest.sequence,
                                "start ledger not closed yet; waiting for it"
                            );
                            start
                        }
                        Some(start) => {
                            tracing::warn!(
                                ledger = start,
                                latest = latest.sequence,
                                "start ledger unavailable; starting at latest"
                            );
                            latest.sequence
                        }
                        None => {
                            tracing::info!(ledger = latest.sequence, "no start ledger; starting at latest");
                            latest.sequence
                        }
                    });
                }
                Err(e) => tracing::warn!(error = %e, "could not fetch latest ledger; retrying"),
            }
            if !self.pause(self.config.error_delay()).await {
                return None;
            }
        }
    }

    /// Stream cursor: the start ledger's paging token, or `now`.
    async fn resolve_stream_cursor(&self) -> StreamCursor {
        let Some(start) = self.config.start_ledger else {
            return StreamCursor::Now;
        };
        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return StreamCursor::Now,
            r = self.feed.ledger(start) => r,
        };
        match result {
            Ok(ledger) => {
                tracing::info!(ledger = start, token = %ledger.paging_token, "resuming stream");
                StreamCursor::token(ledger.paging_token)
            }
            Err(e) => {
                tracing::warn!(ledger = start, error = %e, "start ledger unavailable; streaming from now");
                StreamCursor::Now
            }
        }
    }

    /// Sleep for `delay`. `false` if shutdown fired first.
    async fn pause(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.shutdown.is_cancelled();
        }
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

/// Subscription task: forward notified ledger sequences to the worker.
/// Returns (dropping `tx`) when the stream closes or fails to open.
async fn forward_ledgers<F: LedgerFeed>(
    feed: Arc<F>,
    cursor: StreamCursor,
    tx: mpsc::Sender<u64>,
    shutdown: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        _ = shutdown.cancelled() => return,
        r = feed.subscribe_ledgers(cursor) => r,
    };
    let mut stream = match opened {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "could not open ledger stream");
            return;
        }
    };

    loop {
        let item = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            item = stream.next() => item,
        };
        match item {
            Some(Ok(ledger)) => {
                tracing::trace!(ledger = ledger.sequence, "ledger notified");
                if tx.send(ledger.sequence).await.is_err() {
                    return;
                }
            }
            Some(Err(FeedError::StreamClosed(reason))) => {
                tracing::error!(%reason, "ledger stream closed");
                return;
            }
            Some(Err(e)) => tracing::warn!(error = %e, "bad ledger notification; skipping"),
            None => {
                tracing::info!("ledger stream finished");
                return;
            }
        }
    }
}
