//! Per-ledger processing: metadata → filter → supply ledger → reporter.

use chrono::Utc;
use supplywatch_core::handler::SupplyReporter;
use supplywatch_core::supply::{ApplyOutcome, SupplyLedger};
use supplywatch_core::types::{
    AssetEventReport, LedgerReport, MonitorPhase, UntrackedEventReport,
};

use crate::asset::{AssetError, AssetIdentity, Network};
use crate::fetcher::TransactionRecord;
use crate::filter;
use crate::meta::{self, MetaDecode};
use crate::strkey;

/// Owns the supply ledger and the asset's cached contract id.
///
/// Processing is synchronous: once a ledger's transactions are in hand,
/// every event is applied before control returns.
#[derive(Debug)]
pub struct EventProcessor {
    asset: AssetIdentity,
    canonical: String,
    contract_id: [u8; 32],
    supply: SupplyLedger,
}

impl EventProcessor {
    /// Derive the contract id for `asset` on `network` once.
    pub fn new(asset: AssetIdentity, network: &Network) -> Result<Self, AssetError> {
        let contract_id = asset.contract_id(network)?;
        Ok(Self::with_contract_id(asset, contract_id))
    }

    pub fn with_contract_id(asset: AssetIdentity, contract_id: [u8; 32]) -> Self {
        Self {
            canonical: asset.canonical(),
            asset,
            contract_id,
            supply: SupplyLedger::new(),
        }
    }

    pub fn asset(&self) -> &AssetIdentity {
        &self.asset
    }

    pub fn contract_id(&self) -> &[u8; 32] {
        &self.contract_id
    }

    pub fn contract_strkey(&self) -> String {
        strkey::encode_contract(&self.contract_id)
    }

    pub fn supply(&self) -> &SupplyLedger {
        &self.supply
    }

    /// Apply every asset event of one ledger, then emit its progress report.
    pub fn process_ledger(
        &mut self,
        sequence: u64,
        phase: MonitorPhase,
        transactions: &[TransactionRecord],
        reporter: &mut dyn SupplyReporter,
    ) -> LedgerReport {
        let mut supply_events = 0;
        for tx in transactions {
            supply_events += self.process_transaction(sequence, tx, reporter);
        }

        let report = LedgerReport {
            sequence,
            phase,
            transactions: transactions.len(),
            supply_events,
            supply: self.supply.format(),
            processed_at: Utc::now(),
        };
        tracing::debug!(
            ledger = sequence,
            transactions = report.transactions,
            supply_events,
            supply = %report.supply,
            "ledger processed"
        );
        reporter.ledger_processed(&report);
        report
    }

    /// Apply one transaction's asset events. Returns how many changed supply.
    pub fn process_transaction(
        &mut self,
        sequence: u64,
        tx: &TransactionRecord,
        reporter: &mut dyn SupplyReporter,
    ) -> usize {
        let Some(meta_xdr) = tx.result_meta_xdr.as_deref() else {
            tracing::debug!(ledger = sequence, tx = %tx.hash, "transaction has no result meta");
            return 0;
        };

        let operations = match meta::decode(meta_xdr) {
            MetaDecode::Events(ops) => ops,
            MetaDecode::Skipped { version } => {
                tracing::trace!(ledger = sequence, tx = %tx.hash, version, "pre-v4 meta, no events");
                return 0;
            }
            MetaDecode::Malformed(reason) => {
                tracing::warn!(ledger = sequence, tx = %tx.hash, %reason, "malformed transaction meta");
                return 0;
            }
        };

        let mut applied = 0;
        for event in operations.iter().flatten() {
            if !filter::matches(event, &self.contract_id) {
                continue;
            }
            let extracted = filter::extract(event);
            if !filter::is_asset_event(&extracted, &self.canonical) {
                continue;
            }
            let kind = extracted.kind().unwrap_or_default();

            match self.supply.apply(kind, &extracted.amount) {
                Ok(ApplyOutcome::Applied { kind, .. }) => {
                    applied += 1;
                    let report = AssetEventReport {
                        ledger: sequence,
                        tx_hash: tx.hash.clone(),
                        kind: kind.to_string(),
                        amount: extracted.amount.clone(),
                        supply: self.supply.format(),
                    };
                    tracing::info!(
                        ledger = sequence,
                        tx = %tx.hash,
                        kind = %kind,
                        amount = %report.amount,
                        supply = %report.supply,
                        "supply changed"
                    );
                    reporter.asset_event(&report);
                }
                Ok(ApplyOutcome::Untracked { kind }) => {
                    tracing::debug!(ledger = sequence, tx = %tx.hash, %kind, "asset event without supply effect");
                    reporter.untracked_event(&UntrackedEventReport {
                        ledger: sequence,
                        tx_hash: tx.hash.clone(),
                        kind,
                    });
                }
                Err(e) => {
                    tracing::warn!(ledger = sequence, tx = %tx.hash, error = %e, "skipping asset event");
                }
            }
        }
        applied
    }
}
