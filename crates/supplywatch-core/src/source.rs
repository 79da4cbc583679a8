//! `LedgerSource`: one `next_ledger()` abstraction over both traversal modes.
//!
//! Historical replay and live streaming feed the same sequential worker:
//!
//! ```text
//! HistoricalSource (LedgerCursor, counts up)  ─┐
//!                                              ├─► next_ledger() ─► worker
//! ChannelSource (subscription task → mpsc)    ─┘
//! ```

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::cursor::LedgerCursor;
use crate::types::MonitorPhase;

/// A sequential supplier of ledger sequence numbers.
#[async_trait]
pub trait LedgerSource: Send {
    /// The traversal mode this source implements.
    fn phase(&self) -> MonitorPhase;

    /// Wait for the next ledger to process. `None` means the source is
    /// exhausted (bounded replay finished or the subscription ended).
    async fn next_ledger(&mut self) -> Option<u64>;

    /// Called by the worker once `sequence` has been fully processed.
    fn processed(&mut self, _sequence: u64) {}
}

// ─── Historical ───────────────────────────────────────────────────────────────

/// Counts up from a starting ledger, optionally stopping at an end ledger.
///
/// `next_ledger` keeps returning the same sequence until the worker reports it
/// processed, which is how a failed fetch gets retried.
#[derive(Debug, Clone)]
pub struct HistoricalSource {
    cursor: LedgerCursor,
    end: Option<u64>,
}

impl HistoricalSource {
    pub fn new(start: u64) -> Self {
        Self {
            cursor: LedgerCursor::starting_at(start),
            end: None,
        }
    }

    /// Stop after `end` (inclusive).
    pub fn until(mut self, end: u64) -> Self {
        self.end = Some(end);
        self
    }

    pub fn cursor(&self) -> &LedgerCursor {
        &self.cursor
    }
}

#[async_trait]
impl LedgerSource for HistoricalSource {
    fn phase(&self) -> MonitorPhase {
        MonitorPhase::Historical
    }

    async fn next_ledger(&mut self) -> Option<u64> {
        let next = self.cursor.next_ledger();
        match self.end {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }

    fn processed(&mut self, sequence: u64) {
        self.cursor.advance(sequence);
    }
}

// ─── Streaming ────────────────────────────────────────────────────────────────

/// Receives ledger sequences from a single producer (the subscription task).
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<u64>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<u64>) -> Self {
        Self { rx }
    }

    /// Create a bounded channel and the source reading from it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<u64>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl LedgerSource for ChannelSource {
    fn phase(&self) -> MonitorPhase {
        MonitorPhase::Streaming
    }

    async fn next_ledger(&mut self) -> Option<u64> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn historical_repeats_until_processed() {
        let mut source = HistoricalSource::new(10);
        assert_eq!(source.next_ledger().await, Some(10));
        // Not processed yet: same ledger again (retry path).
        assert_eq!(source.next_ledger().await, Some(10));

        source.processed(10);
        assert_eq!(source.next_ledger().await, Some(11));
        assert_eq!(source.cursor().last_processed(), Some(10));
    }

    #[tokio::test]
    async fn historical_stops_after_end() {
        let mut source = HistoricalSource::new(5).until(6);
        assert_eq!(source.next_ledger().await, Some(5));
        source.processed(5);
        assert_eq!(source.next_ledger().await, Some(6));
        source.processed(6);
        assert_eq!(source.next_ledger().await, None);
    }

    #[tokio::test]
    async fn channel_source_preserves_order_and_closes() {
        let (tx, mut source) = ChannelSource::channel(8);
        tx.send(100).await.unwrap();
        tx.send(101).await.unwrap();
        tx.send(101).await.unwrap(); // duplicate delivery is passed through
        drop(tx);

        assert_eq!(source.phase(), MonitorPhase::Streaming);
        assert_eq!(source.next_ledger().await, Some(100));
        assert_eq!(source.next_ledger().await, Some(101));
        assert_eq!(source.next_ledger().await, Some(101));
        assert_eq!(source.next_ledger().await, None);
    }
}
