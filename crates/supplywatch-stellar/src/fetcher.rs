//! Ledger feed abstraction and the records it returns.
//!
//! `HorizonClient` is the production implementation; tests substitute an
//! in-memory feed.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};

use supplywatch_core::cursor::StreamCursor;
use supplywatch_core::error::FeedError;

/// A closed ledger as reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(deserialize_with = "de_u64_lenient")]
    pub sequence: u64,
    pub paging_token: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub successful_transaction_count: u32,
    #[serde(default)]
    pub failed_transaction_count: Option<u32>,
    #[serde(default)]
    pub operation_count: u32,
}

/// A transaction with its result metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    #[serde(default)]
    pub ledger: u64,
    #[serde(default = "default_true")]
    pub successful: bool,
    #[serde(default)]
    pub paging_token: String,
    /// Base64 `TransactionMeta`. Absent when the feed omits metadata.
    #[serde(default)]
    pub result_meta_xdr: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Ledger notifications from a live subscription, in delivery order.
pub type LedgerStream = Pin<Box<dyn Stream<Item = Result<LedgerRecord, FeedError>> + Send>>;

/// Read access to closed ledgers.
#[async_trait]
pub trait LedgerFeed: Send + Sync {
    /// Look up one ledger. `FeedError::NotFound` if it has not closed yet.
    async fn ledger(&self, sequence: u64) -> Result<LedgerRecord, FeedError>;

    /// The most recently closed ledger.
    async fn latest_ledger(&self) -> Result<LedgerRecord, FeedError>;

    /// Every transaction of `sequence`, in ledger order, across all pages.
    async fn transactions(&self, sequence: u64) -> Result<Vec<TransactionRecord>, FeedError>;

    /// Subscribe to ledgers closing after `cursor`.
    async fn subscribe_ledgers(&self, cursor: StreamCursor) -> Result<LedgerStream, FeedError>;
}

#[async_trait]
impl<F: LedgerFeed + ?Sized> LedgerFeed for std::sync::Arc<F> {
    async fn ledger(&self, sequence: u64) -> Result<LedgerRecord, FeedError> {
        (**self).ledger(sequence).await
    }

    async fn latest_ledger(&self) -> Result<LedgerRecord, FeedError> {
        (**self).latest_ledger().await
    }

    async fn transactions(&self, sequence: u64) -> Result<Vec<TransactionRecord>, FeedError> {
        (**self).transactions(sequence).await
    }

    async fn subscribe_ledgers(&self, cursor: StreamCursor) -> Result<LedgerStream, FeedError> {
        (**self).subscribe_ledgers(cursor).await
    }
}

/// Parse a numeric field Horizon may send either as a JSON string or number.
pub(crate) fn de_u64_lenient<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        N(u64),
        S(String),
    }
    match Num::deserialize(de)? {
        Num::N(n) => Ok(n),
        Num::S(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
