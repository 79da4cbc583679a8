//! Transaction metadata decoding down to per-operation contract events.

use stellar_xdr::curr::{ContractEvent, Limits, ReadXdr, TransactionMeta};

/// Events of one operation, in emission order.
pub type OperationEvents = Vec<ContractEvent>;

/// Outcome of decoding one `result_meta_xdr` envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaDecode {
    /// V4 metadata: one entry per operation, in operation order.
    Events(Vec<OperationEvents>),
    /// Valid metadata of a version that carries no unified events.
    Skipped { version: u8 },
    /// Not valid base64 / XDR.
    Malformed(String),
}

impl MetaDecode {
    /// Per-operation events, empty unless [`MetaDecode::Events`].
    pub fn into_events(self) -> Vec<OperationEvents> {
        match self {
            Self::Events(ops) => ops,
            Self::Skipped { .. } | Self::Malformed(_) => Vec::new(),
        }
    }
}

/// Decode a base64 `TransactionMeta`.
pub fn decode(meta_xdr: &str) -> MetaDecode {
    match TransactionMeta::from_xdr_base64(meta_xdr, Limits::none()) {
        Ok(meta) => from_meta(meta),
        Err(e) => MetaDecode::Malformed(e.to_string()),
    }
}

/// Split already-decoded metadata into per-operation events.
pub fn from_meta(meta: TransactionMeta) -> MetaDecode {
    match meta {
        TransactionMeta::V4(v4) => MetaDecode::Events(
            v4.operations
                .iter()
                .map(|op| op.events.iter().cloned().collect())
                .collect(),
        ),
        TransactionMeta::V0(_) => MetaDecode::Skipped { version: 0 },
        TransactionMeta::V1(_) => MetaDecode::Skipped { version: 1 },
        TransactionMeta::V2(_) => MetaDecode::Skipped { version: 2 },
        TransactionMeta::V3(_) => MetaDecode::Skipped { version: 3 },
    }
}

/// [`decode`] flattened to its per-operation events.
pub fn operation_events(meta_xdr: &str) -> Vec<OperationEvents> {
    decode(meta_xdr).into_events()
}
