//! `ScVal` → [`NativeValue`] decoding.
//!
//! Decoding is total: variants without a native form come back as
//! [`NativeValue::Unsupported`] carrying their debug rendering.

use std::fmt;

use stellar_xdr::curr::{
    ClaimableBalanceId, Int128Parts, MuxedEd25519Account, PublicKey, ScAddress, ScVal,
    UInt128Parts,
};

use crate::strkey;

/// A contract value in native form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    U128(u128),
    I128(i128),
    Symbol(String),
    Str(String),
    Bytes(Vec<u8>),
    /// Strkey text (`G...`, `C...`, `M...`, `B...` or `L...`).
    Address(String),
    Vec(Vec<NativeValue>),
    Map(Vec<(NativeValue, NativeValue)>),
    Unsupported { tag: &'static str, raw: String },
}

impl NativeValue {
    /// Type label used by [`format_typed`](Self::format_typed).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "void",
            Self::Bool(_) => "bool",
            Self::U32(_) => "u32",
            Self::I32(_) => "i32",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::U128(_) => "u128",
            Self::I128(_) => "i128",
            Self::Symbol(_) => "symbol",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Address(_) => "address",
            Self::Vec(_) => "vec",
            Self::Map(_) => "map",
            Self::Unsupported { tag, .. } => *tag,
        }
    }

    /// `"<type>: <value>"`. Addresses render as the bare strkey.
    pub fn format_typed(&self) -> String {
        match self {
            Self::Address(a) => a.clone(),
            Self::Null => "void: null".to_string(),
            other => format!("{}: {}", other.type_name(), other),
        }
    }

    /// String content of a symbol or string value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) | Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a map entry whose key is the text `key`.
    pub fn map_get(&self, key: &str) -> Option<&NativeValue> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_text() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U128(v) => write!(f, "{v}"),
            Self::I128(v) => write!(f, "{v}"),
            Self::Symbol(s) | Self::Str(s) | Self::Address(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Self::Vec(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Unsupported { tag, raw } => write!(f, "{tag}({raw})"),
        }
    }
}

/// Decode a contract value. Never fails.
pub fn decode(val: &ScVal) -> NativeValue {
    match val {
        ScVal::Void => NativeValue::Null,
        ScVal::Bool(b) => NativeValue::Bool(*b),
        ScVal::U32(v) => NativeValue::U32(*v),
        ScVal::I32(v) => NativeValue::I32(*v),
        ScVal::U64(v) => NativeValue::U64(*v),
        ScVal::I64(v) => NativeValue::I64(*v),
        ScVal::Timepoint(t) => NativeValue::U64(t.0),
        ScVal::Duration(d) => NativeValue::U64(d.0),
        ScVal::U128(parts) => narrow_u128(u128_from_parts(parts)),
        ScVal::I128(parts) => narrow_i128(i128_from_parts(parts)),
        ScVal::Bytes(b) => NativeValue::Bytes(b.0.to_vec()),
        ScVal::String(s) => NativeValue::Str(s.0.to_utf8_string_lossy()),
        ScVal::Symbol(s) => NativeValue::Symbol(s.0.to_utf8_string_lossy()),
        ScVal::Address(addr) => NativeValue::Address(address_to_strkey(addr)),
        ScVal::Vec(Some(items)) => NativeValue::Vec(items.0.iter().map(decode).collect()),
        ScVal::Vec(None) => NativeValue::Vec(Vec::new()),
        ScVal::Map(Some(map)) => NativeValue::Map(
            map.0
                .iter()
                .map(|entry| (decode(&entry.key), decode(&entry.val)))
                .collect(),
        ),
        ScVal::Map(None) => NativeValue::Map(Vec::new()),
        ScVal::Error(e) => unsupported("error", e),
        ScVal::U256(v) => unsupported("u256", v),
        ScVal::I256(v) => unsupported("i256", v),
        ScVal::ContractInstance(v) => unsupported("contract_instance", v),
        ScVal::LedgerKeyContractInstance => unsupported("ledger_key_contract_instance", val),
        ScVal::LedgerKeyNonce(v) => unsupported("ledger_key_nonce", v),
    }
}

fn unsupported(tag: &'static str, raw: &impl fmt::Debug) -> NativeValue {
    NativeValue::Unsupported {
        tag,
        raw: format!("{raw:?}"),
    }
}

// Values that fit in 64 bits are reported as 64-bit to keep output stable.
fn narrow_u128(v: u128) -> NativeValue {
    match u64::try_from(v) {
        Ok(small) => NativeValue::U64(small),
        Err(_) => NativeValue::U128(v),
    }
}

fn narrow_i128(v: i128) -> NativeValue {
    match i64::try_from(v) {
        Ok(small) => NativeValue::I64(small),
        Err(_) => NativeValue::I128(v),
    }
}

/// `(hi << 64) | lo` with `hi` signed and `lo` unsigned.
pub fn i128_from_parts(parts: &Int128Parts) -> i128 {
    ((parts.hi as i128) << 64) | parts.lo as i128
}

pub fn i128_to_parts(v: i128) -> Int128Parts {
    Int128Parts {
        hi: (v >> 64) as i64,
        lo: v as u64,
    }
}

pub fn u128_from_parts(parts: &UInt128Parts) -> u128 {
    ((parts.hi as u128) << 64) | parts.lo as u128
}

pub fn u128_to_parts(v: u128) -> UInt128Parts {
    UInt128Parts {
        hi: (v >> 64) as u64,
        lo: v as u64,
    }
}

/// Render any address variant as its strkey.
pub fn address_to_strkey(addr: &ScAddress) -> String {
    match addr {
        ScAddress::Account(account) => match &account.0 {
            PublicKey::PublicKeyTypeEd25519(key) => strkey::encode_account(&key.0),
        },
        ScAddress::Contract(id) => strkey::encode_contract(&id.0 .0),
        ScAddress::MuxedAccount(MuxedEd25519Account { id, ed25519 }) => {
            strkey::encode_muxed_account(&ed25519.0, *id)
        }
        ScAddress::ClaimableBalance(ClaimableBalanceId::ClaimableBalanceIdTypeV0(hash)) => {
            strkey::encode_claimable_balance(&hash.0)
        }
        ScAddress::LiquidityPool(pool) => strkey::encode_liquidity_pool(&pool.0 .0),
    }
}
