//! Reporter trait: where processed ledgers and supply events go.

use std::sync::{Arc, Mutex};

use crate::types::{AssetEventReport, LedgerReport, MonitorSummary, UntrackedEventReport};

/// Sink for monitor output.
///
/// Calls happen synchronously on the worker, in processing order: every
/// `asset_event` of a ledger precedes that ledger's `ledger_processed`.
pub trait SupplyReporter: Send {
    /// Called once before the first ledger.
    fn configuration(&mut self, summary: &MonitorSummary);

    /// Called after every fully processed ledger.
    fn ledger_processed(&mut self, report: &LedgerReport);

    /// Called for every event that changed supply.
    fn asset_event(&mut self, report: &AssetEventReport);

    /// Called for asset events whose kind leaves supply unchanged.
    fn untracked_event(&mut self, _report: &UntrackedEventReport) {}
}

impl<R: SupplyReporter + ?Sized> SupplyReporter for Box<R> {
    fn configuration(&mut self, summary: &MonitorSummary) {
        (**self).configuration(summary)
    }

    fn ledger_processed(&mut self, report: &LedgerReport) {
        (**self).ledger_processed(report)
    }

    fn asset_event(&mut self, report: &AssetEventReport) {
        (**self).asset_event(report)
    }

    fn untracked_event(&mut self, report: &UntrackedEventReport) {
        (**self).untracked_event(report)
    }
}

/// Everything a [`MemoryReporter`] has seen.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub summary: Option<MonitorSummary>,
    pub ledgers: Vec<LedgerReport>,
    pub events: Vec<AssetEventReport>,
    pub untracked: Vec<UntrackedEventReport>,
}

/// Reporter that records into shared memory. Clones share the same record,
/// so a test can keep one handle while the monitor owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    inner: Arc<Mutex<Recorded>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn recorded(&self) -> Recorded {
        self.inner.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Sequences of processed ledgers, in order.
    pub fn ledgers(&self) -> Vec<u64> {
        self.recorded().ledgers.iter().map(|l| l.sequence).collect()
    }

    /// Supply string of the last processed ledger.
    pub fn last_supply(&self) -> Option<String> {
        self.recorded().ledgers.last().map(|l| l.supply.clone())
    }

    fn with(&self, f: impl FnOnce(&mut Recorded)) {
        if let Ok(mut guard) = self.inner.lock() {
            f(&mut guard);
        }
    }
}

impl SupplyReporter for MemoryReporter {
    fn configuration(&mut self, summary: &MonitorSummary) {
        let summary = summary.clone();
        self.with(|r| r.summary = Some(summary));
    }

    fn ledger_processed(&mut self, report: &LedgerReport) {
        self.with(|r| r.ledgers.push(report.clone()));
    }

    fn asset_event(&mut self, report: &AssetEventReport) {
        self.with(|r| r.events.push(report.clone()));
    }

    fn untracked_event(&mut self, report: &UntrackedEventReport) {
        self.with(|r| r.untracked.push(report.clone()));
    }
}
