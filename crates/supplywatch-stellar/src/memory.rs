//! In-memory [`LedgerFeed`] for replaying captured ledgers and for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use supplywatch_core::cursor::StreamCursor;
use supplywatch_core::error::FeedError;

use crate::fetcher::{LedgerFeed, LedgerRecord, LedgerStream, TransactionRecord};

#[derive(Debug, Default)]
struct Inner {
    ledgers: HashMap<u64, LedgerRecord>,
    transactions: HashMap<u64, Vec<TransactionRecord>>,
    /// Remaining injected failures per ledger.
    failures: HashMap<u64, u32>,
    /// Items handed out by the next `subscribe_ledgers` call.
    stream: Vec<Result<LedgerRecord, FeedError>>,
    subscriptions: Vec<StreamCursor>,
    fetches: Vec<u64>,
}

/// A feed backed by maps. Ledgers without transactions are `NotFound`.
#[derive(Debug, Default)]
pub struct MemoryFeed {
    inner: Mutex<Inner>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paging token derived the way Horizon does: `sequence << 32`.
    pub fn paging_token(sequence: u64) -> String {
        (sequence << 32).to_string()
    }

    /// Add a closed ledger with its transactions.
    pub fn insert_ledger(&self, sequence: u64, transactions: Vec<TransactionRecord>) {
        let record = LedgerRecord {
            sequence,
            paging_token: Self::paging_token(sequence),
            hash: String::new(),
            closed_at: None,
            successful_transaction_count: transactions.len() as u32,
            failed_transaction_count: Some(0),
            operation_count: 0,
        };
        self.with(|inner| {
            inner.ledgers.insert(sequence, record);
            inner.transactions.insert(sequence, transactions);
        });
    }

    /// Fail the next `times` transaction fetches for `sequence`.
    pub fn fail_next(&self, sequence: u64, times: u32) {
        self.with(|inner| {
            inner.failures.insert(sequence, times);
        });
    }

    /// Queue ledger notifications for the next subscription. Each sequence
    /// must already be inserted.
    pub fn queue_stream(&self, sequences: &[u64]) {
        self.with(|inner| {
            for seq in sequences {
                let item = inner
                    .ledgers
                    .get(seq)
                    .cloned()
                    .ok_or(FeedError::NotFound { sequence: *seq });
                inner.stream.push(item);
            }
        });
    }

    /// Queue a stream error after the notifications queued so far.
    pub fn queue_stream_error(&self, error: FeedError) {
        self.with(|inner| inner.stream.push(Err(error)));
    }

    /// Ledgers whose transactions were requested, in call order.
    pub fn fetches(&self) -> Vec<u64> {
        self.with(|inner| inner.fetches.clone())
    }

    /// Cursors passed to `subscribe_ledgers`, in call order.
    pub fn subscriptions(&self) -> Vec<StreamCursor> {
        self.with(|inner| inner.subscriptions.clone())
    }

    fn with<T: Default>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        match self.inner.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(_) => T::default(),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, FeedError> {
        self.inner
            .lock()
            .map_err(|_| FeedError::Other("memory feed poisoned".into()))
    }
}

#[async_trait]
impl LedgerFeed for MemoryFeed {
    async fn ledger(&self, sequence: u64) -> Result<LedgerRecord, FeedError> {
        self.lock()?
            .ledgers
            .get(&sequence)
            .cloned()
            .ok_or(FeedError::NotFound { sequence })
    }

    async fn latest_ledger(&self) -> Result<LedgerRecord, FeedError> {
        let inner = self.lock()?;
        inner
            .ledgers
            .keys()
            .max()
            .and_then(|seq| inner.ledgers.get(seq))
            .cloned()
            .ok_or_else(|| FeedError::Other("no ledgers".into()))
    }

    async fn transactions(&self, sequence: u64) -> Result<Vec<TransactionRecord>, FeedError> {
        let mut inner = self.lock()?;
        inner.fetches.push(sequence);

        if let Some(left) = inner.failures.get_mut(&sequence) {
            if *left > 0 {
                *left -= 1;
                return Err(FeedError::Http("injected failure".into()));
            }
        }
        inner
            .transactions
            .get(&sequence)
            .cloned()
            .ok_or(FeedError::NotFound { sequence })
    }

    async fn subscribe_ledgers(&self, cursor: StreamCursor) -> Result<LedgerStream, FeedError> {
        let mut inner = self.lock()?;
        inner.subscriptions.push(cursor);
        let items = std::mem::take(&mut inner.stream);
        Ok(Box::pin(futures::stream::iter(items)))
    }
}
