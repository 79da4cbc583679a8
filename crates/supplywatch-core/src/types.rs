//! Shared types for the monitoring pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── MonitorPhase ─────────────────────────────────────────────────────────────

/// Which traversal mode produced a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorPhase {
    /// Sequential replay driven by an incrementing ledger counter.
    Historical,
    /// Ledgers delivered by a live subscription.
    Streaming,
}

// ─── MonitorSummary ───────────────────────────────────────────────────────────

/// What the monitor is watching, reported once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSummary {
    /// Feed base URL.
    pub feed_url: String,
    /// Network passphrase.
    pub network: String,
    /// Canonical `code:issuer` descriptor.
    pub asset: String,
    /// Derived asset contract id (`C...` strkey).
    pub contract_id: String,
    pub phase: MonitorPhase,
    pub start_ledger: Option<u64>,
}

// ─── Reports ──────────────────────────────────────────────────────────────────

/// Emitted once per fully processed ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub sequence: u64,
    pub phase: MonitorPhase,
    /// Transactions fetched for the ledger.
    pub transactions: usize,
    /// Asset events that changed supply in this ledger.
    pub supply_events: usize,
    /// Running supply, formatted in whole units.
    pub supply: String,
    pub processed_at: DateTime<Utc>,
}

/// Emitted for every event that changed supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEventReport {
    pub ledger: u64,
    pub tx_hash: String,
    /// `mint`, `burn` or `clawback`.
    pub kind: String,
    /// Amount in stroops, exactly as carried by the event.
    pub amount: String,
    /// Running supply after this event, formatted in whole units.
    pub supply: String,
}

/// Emitted for asset events whose kind does not affect supply
/// (`transfer`, `approve`, `set_admin`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntrackedEventReport {
    pub ledger: u64,
    pub tx_hash: String,
    pub kind: String,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
