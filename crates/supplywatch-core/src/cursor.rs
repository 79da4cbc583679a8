//! Ledger cursors: where traversal starts and where it currently is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resume position for a ledger subscription.
///
/// Either the paging token of a specific ledger, or the `now` sentinel which
/// only delivers ledgers closed after the subscription opens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamCursor {
    #[default]
    Now,
    Token(String),
}

impl StreamCursor {
    /// The literal the feed expects for the sentinel.
    pub const NOW: &'static str = "now";

    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Query-string value for the `cursor` parameter.
    pub fn as_param(&self) -> &str {
        match self {
            Self::Now => Self::NOW,
            Self::Token(t) => t,
        }
    }

    pub fn is_now(&self) -> bool {
        matches!(self, Self::Now)
    }
}

impl fmt::Display for StreamCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Position of a sequential (historical) traversal.
///
/// The cursor only moves forward once a ledger has been fully processed, so a
/// failed fetch leaves `next_ledger` pointing at the same sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerCursor {
    /// Next ledger to fetch.
    next: u64,
    /// Last ledger that was fully folded into the supply ledger.
    last_processed: Option<u64>,
}

impl LedgerCursor {
    /// Start a traversal at `start` (inclusive).
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: start,
            last_processed: None,
        }
    }

    /// The ledger to fetch next.
    pub fn next_ledger(&self) -> u64 {
        self.next
    }

    pub fn last_processed(&self) -> Option<u64> {
        self.last_processed
    }

    /// Mark `sequence` as processed and move to the following ledger.
    pub fn advance(&mut self, sequence: u64) {
        self.last_processed = Some(sequence);
        self.next = sequence + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_cursor_param() {
        assert_eq!(StreamCursor::Now.as_param(), "now");
        assert_eq!(StreamCursor::default().to_string(), "now");
        assert!(StreamCursor::Now.is_now());
    }

    #[test]
    fn token_cursor_param() {
        let c = StreamCursor::token("2547814084968448");
        assert_eq!(c.as_param(), "2547814084968448");
        assert!(!c.is_now());
    }

    #[test]
    fn ledger_cursor_advance() {
        let mut cursor = LedgerCursor::starting_at(593_231);
        assert_eq!(cursor.next_ledger(), 593_231);
        assert_eq!(cursor.last_processed(), None);

        cursor.advance(593_231);
        assert_eq!(cursor.next_ledger(), 593_232);
        assert_eq!(cursor.last_processed(), Some(593_231));
    }
}
