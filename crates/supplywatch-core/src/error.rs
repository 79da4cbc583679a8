//! Error types for the supplywatch pipeline.

use thiserror::Error;

/// Errors raised by the ledger feed transport.
///
/// These are the only errors that reach the monitor loop; every variant is
/// treated as transient and retried after the error delay.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed (connection refused, reset, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The feed answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The requested ledger does not exist (yet).
    #[error("ledger {sequence} not found")]
    NotFound { sequence: u64 },

    /// Request timed out.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response body could not be deserialized.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The ledger subscription stream ended or failed.
    #[error("ledger stream closed: {0}")]
    StreamClosed(String),

    #[error("{0}")]
    Other(String),
}

impl FeedError {
    /// Returns `true` for the "ledger not closed yet" case, which historical
    /// mode hits routinely once it catches up with the chain tip.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors from applying an event to the supply ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupplyError {
    #[error("invalid amount {amount:?} for {kind} event")]
    InvalidAmount { kind: String, amount: String },
}

/// Startup configuration errors. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
