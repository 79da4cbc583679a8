//! Supply ledger: signed accumulation of mint / burn / clawback deltas.
//!
//! Amounts are integer stroops (1 unit = 10^7 stroops). The ledger never
//! rejects a negative running total: burns observed before their mints (a
//! replay started mid-history) legitimately drive it below zero.

use num_bigint::{BigInt, BigUint, Sign};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SupplyError;

/// Number of fractional digits in a display amount.
pub const DECIMALS: usize = 7;

/// Stroops per whole unit.
pub const STROOPS_PER_UNIT: u64 = 10_000_000;

// ─── EventKind ────────────────────────────────────────────────────────────────

/// Event kinds that change supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Mint,
    Burn,
    Clawback,
}

impl EventKind {
    /// Parse a topic symbol. Returns `None` for kinds that leave supply alone.
    pub fn from_topic(topic: &str) -> Option<Self> {
        match topic {
            "mint" => Some(Self::Mint),
            "burn" => Some(Self::Burn),
            "clawback" => Some(Self::Clawback),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Burn => "burn",
            Self::Clawback => "clawback",
        }
    }

    /// `true` when the event adds to supply.
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::Mint)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── ApplyOutcome ─────────────────────────────────────────────────────────────

/// Result of feeding one event into the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Supply changed by `delta` (signed, stroops).
    Applied {
        kind: EventKind,
        delta: BigInt,
        supply: BigInt,
    },
    /// Kind is not supply-relevant; nothing changed.
    Untracked { kind: String },
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

// ─── SupplyLedger ─────────────────────────────────────────────────────────────

/// Running supply plus per-kind counters.
#[derive(Debug, Clone, Default)]
pub struct SupplyLedger {
    supply: BigInt,
    stats: SupplyStats,
}

/// Event counters kept alongside the supply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyStats {
    pub mints: u64,
    pub burns: u64,
    pub clawbacks: u64,
    pub untracked: u64,
    /// Events dropped because their amount did not parse.
    pub rejected: u64,
}

/// Serializable view of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplySnapshot {
    /// Raw supply in stroops.
    pub stroops: String,
    /// Supply in whole units.
    pub formatted: String,
    pub stats: SupplyStats,
}

impl SupplyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. All-or-nothing: on `Err` the supply is untouched.
    pub fn apply(&mut self, kind: &str, amount: &str) -> Result<ApplyOutcome, SupplyError> {
        let Some(event_kind) = EventKind::from_topic(kind) else {
            self.stats.untracked += 1;
            return Ok(ApplyOutcome::Untracked {
                kind: kind.to_string(),
            });
        };

        let amount = match BigInt::from_str(amount) {
            Ok(v) => v,
            Err(_) => {
                self.stats.rejected += 1;
                return Err(SupplyError::InvalidAmount {
                    kind: kind.to_string(),
                    amount: amount.to_string(),
                });
            }
        };

        let delta = if event_kind.is_credit() { amount } else { -amount };
        self.supply += &delta;
        match event_kind {
            EventKind::Mint => self.stats.mints += 1,
            EventKind::Burn => self.stats.burns += 1,
            EventKind::Clawback => self.stats.clawbacks += 1,
        }

        Ok(ApplyOutcome::Applied {
            kind: event_kind,
            delta,
            supply: self.supply.clone(),
        })
    }

    /// Raw supply in stroops.
    pub fn supply(&self) -> &BigInt {
        &self.supply
    }

    pub fn stats(&self) -> SupplyStats {
        self.stats
    }

    /// Supply in whole units, see [`format_stroops`].
    pub fn format(&self) -> String {
        format_stroops(&self.supply)
    }

    pub fn snapshot(&self) -> SupplySnapshot {
        SupplySnapshot {
            stroops: self.supply.to_string(),
            formatted: self.format(),
            stats: self.stats,
        }
    }
}

/// Render stroops as whole units: divide by 10^7, truncate toward zero to
/// seven fractional digits, strip trailing zeros and a trailing point.
pub fn format_stroops(stroops: &BigInt) -> String {
    let unit = BigUint::from(STROOPS_PER_UNIT);
    let magnitude = stroops.magnitude();
    let whole = magnitude / &unit;
    let frac = magnitude % &unit;

    let mut out = String::new();
    if stroops.sign() == Sign::Minus {
        out.push('-');
    }
    out.push_str(&whole.to_string());

    let frac = format!("{:0>width$}", frac.to_string(), width = DECIMALS);
    let frac = frac.trim_end_matches('0');
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(v: i64) -> String {
        format_stroops(&BigInt::from(v))
    }

    #[test]
    fn formatting_examples() {
        assert_eq!(fmt(0), "0");
        assert_eq!(fmt(10_000_000), "1");
        assert_eq!(fmt(12_345_000), "1.2345");
        assert_eq!(fmt(-5_000_000), "-0.5");
        assert_eq!(fmt(19_999_999), "1.9999999");
        assert_eq!(fmt(1), "0.0000001");
        assert_eq!(fmt(-10_000_001), "-1.0000001");
    }

    #[test]
    fn formatting_beyond_i128() {
        let big = BigInt::from_str("1234567890123456789012345678901234567890123").unwrap();
        assert_eq!(format_stroops(&big), "123456789012345678901234567890123456.7890123");
    }

    #[test]
    fn mint_burn_clawback_accumulate() {
        let mut ledger = SupplyLedger::new();
        ledger.apply("mint", "100").unwrap();
        ledger.apply("burn", "30").unwrap();
        let last = ledger.apply("clawback", "20").unwrap();

        assert_eq!(ledger.supply(), &BigInt::from(50));
        assert_eq!(
            last,
            ApplyOutcome::Applied {
                kind: EventKind::Clawback,
                delta: BigInt::from(-20),
                supply: BigInt::from(50),
            }
        );
        let stats = ledger.stats();
        assert_eq!((stats.mints, stats.burns, stats.clawbacks), (1, 1, 1));
    }

    #[test]
    fn unknown_kind_is_untracked() {
        let mut ledger = SupplyLedger::new();
        ledger.apply("mint", "7").unwrap();
        let outcome = ledger.apply("transfer", "100").unwrap();

        assert_eq!(
            outcome,
            ApplyOutcome::Untracked {
                kind: "transfer".into()
            }
        );
        assert!(!outcome.is_applied());
        assert_eq!(ledger.supply(), &BigInt::from(7));
        assert_eq!(ledger.stats().untracked, 1);
    }

    #[test]
    fn malformed_amount_leaves_supply_untouched() {
        let mut ledger = SupplyLedger::new();
        ledger.apply("mint", "500").unwrap();
        let err = ledger.apply("mint", "not-a-number").unwrap_err();

        assert!(matches!(err, SupplyError::InvalidAmount { .. }));
        assert_eq!(ledger.supply(), &BigInt::from(500));
        assert_eq!(ledger.stats().rejected, 1);
        assert_eq!(ledger.stats().mints, 1);
    }

    #[test]
    fn supply_may_go_negative() {
        let mut ledger = SupplyLedger::new();
        ledger.apply("burn", "5000000").unwrap();
        assert_eq!(ledger.format(), "-0.5");
    }

    #[test]
    fn snapshot_carries_raw_and_formatted() {
        let mut ledger = SupplyLedger::new();
        ledger.apply("mint", "12345000").unwrap();
        let snap = ledger.snapshot();
        assert_eq!(snap.stroops, "12345000");
        assert_eq!(snap.formatted, "1.2345");
        assert_eq!(snap.stats.mints, 1);
    }
}
