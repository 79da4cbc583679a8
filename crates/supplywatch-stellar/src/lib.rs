//! supplywatch-stellar: Stellar metadata decoding, asset event filtering,
//! Horizon feed and the monitor loop.

pub mod asset;
pub mod builder;
pub mod fetcher;
pub mod filter;
pub mod horizon;
pub mod index_loop;
pub mod memory;
pub mod meta;
pub mod processor;
pub mod strkey;
pub mod value;

pub use asset::{AssetError, AssetIdentity, Network};
pub use builder::{BuildError, MonitorBuilder, DEFAULT_HORIZON_URL};
pub use fetcher::{LedgerFeed, LedgerRecord, LedgerStream, TransactionRecord};
pub use filter::ExtractedEvent;
pub use horizon::{HorizonClient, HorizonConfig};
pub use index_loop::{MonitorLoop, MonitorOutcome};
pub use memory::MemoryFeed;
pub use meta::{MetaDecode, OperationEvents};
pub use processor::EventProcessor;
pub use strkey::{StrkeyError, StrkeyKind};
pub use value::NativeValue;

// Re-exported so callers can build XDR values without a direct dependency.
pub use stellar_xdr;
