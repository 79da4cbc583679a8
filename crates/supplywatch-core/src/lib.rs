//! supplywatch-core: chain-agnostic pieces of the asset supply monitor.
//!
//! # Architecture
//!
//! ```text
//! MonitorConfig → PollLoop (supplywatch-stellar)
//!                      ├── LedgerSource    (historical counter / stream channel)
//!                      ├── SupplyLedger    (signed BigInt accumulator)
//!                      └── SupplyReporter  (console / JSON lines / memory)
//! ```

pub mod config;
pub mod cursor;
pub mod error;
pub mod handler;
pub mod source;
pub mod supply;
pub mod types;

pub use config::{MonitorConfig, MonitorMode, MonitorState};
pub use cursor::{LedgerCursor, StreamCursor};
pub use error::{ConfigError, FeedError, SupplyError};
pub use handler::{MemoryReporter, Recorded, SupplyReporter};
pub use source::{ChannelSource, HistoricalSource, LedgerSource};
pub use supply::{format_stroops, ApplyOutcome, EventKind, SupplyLedger, SupplySnapshot, SupplyStats};
pub use types::{
    AssetEventReport, LedgerReport, MonitorPhase, MonitorSummary, UntrackedEventReport,
};

// Re-exported so downstream crates agree on the big-integer type.
pub use num_bigint;
