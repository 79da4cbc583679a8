//! Asset event filter: contract-id match and topic / amount extraction.

use stellar_xdr::curr::{ContractEvent, ContractEventBody};

use crate::value::{self, NativeValue};

/// Topics and amount of a contract event, rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEvent {
    pub topics: Vec<String>,
    pub amount: String,
}

impl ExtractedEvent {
    /// `topics[0]`, the event kind.
    pub fn kind(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }
}

/// `true` when the event was emitted by `contract_id`. Events without a
/// contract id never match.
pub fn matches(event: &ContractEvent, contract_id: &[u8; 32]) -> bool {
    event
        .contract_id
        .as_ref()
        .is_some_and(|id| &id.0 .0 == contract_id)
}

/// Decode topics and amount. Never fails.
///
/// Amount comes from the data value, or from its `amount` entry when the
/// data is a map (transfers to muxed destinations). A map without that key
/// falls back to the typed rendering of the whole map.
pub fn extract(event: &ContractEvent) -> ExtractedEvent {
    let ContractEventBody::V0(body) = &event.body;
    let topics = body
        .topics
        .iter()
        .map(|t| value::decode(t).to_string())
        .collect();

    let data = value::decode(&body.data);
    let amount = match &data {
        NativeValue::Map(_) => match data.map_get("amount") {
            Some(v) => v.to_string(),
            None => data.format_typed(),
        },
        other => other.to_string(),
    };

    ExtractedEvent { topics, amount }
}

/// `true` when the third topic names the asset (`code:issuer`).
pub fn is_asset_event(event: &ExtractedEvent, canonical: &str) -> bool {
    event.topics.len() > 2 && event.topics[2] == canonical
}
