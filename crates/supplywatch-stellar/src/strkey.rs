//! Strkey codec: the `G...` / `C...` text form of Stellar keys and ids.
//!
//! Layout: `base32(version ‖ payload ‖ crc16_xmodem(version ‖ payload))`,
//! RFC 4648 alphabet, no padding, checksum little-endian.

use crc::{Crc, CRC_16_XMODEM};
use thiserror::Error;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let mut i = 0;
    while i < 32 {
        table[BASE32_ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrkeyError {
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid base32 character {0:?}")]
    InvalidChar(char),

    #[error("unknown version byte 0x{0:02x}")]
    UnknownVersion(u8),

    #[error("checksum mismatch")]
    Checksum,

    #[error("non-canonical encoding")]
    NonCanonical,
}

/// Kinds of strkey this codec understands, keyed by version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrkeyKind {
    /// `G...` Ed25519 account key.
    Account,
    /// `C...` contract id.
    Contract,
    /// `M...` multiplexed account: key + 64-bit id.
    MuxedAccount,
    /// `B...` claimable balance: type byte + hash.
    ClaimableBalance,
    /// `L...` liquidity pool id.
    LiquidityPool,
}

impl StrkeyKind {
    pub const fn version_byte(self) -> u8 {
        match self {
            Self::Account => 6 << 3,
            Self::Contract => 2 << 3,
            Self::MuxedAccount => 12 << 3,
            Self::ClaimableBalance => 1 << 3,
            Self::LiquidityPool => 11 << 3,
        }
    }

    pub const fn payload_len(self) -> usize {
        match self {
            Self::Account | Self::Contract | Self::LiquidityPool => 32,
            Self::MuxedAccount => 40,
            Self::ClaimableBalance => 33,
        }
    }

    fn from_version(byte: u8) -> Option<Self> {
        [
            Self::Account,
            Self::Contract,
            Self::MuxedAccount,
            Self::ClaimableBalance,
            Self::LiquidityPool,
        ]
        .into_iter()
        .find(|k| k.version_byte() == byte)
    }
}

/// Encode an Ed25519 public key as a `G...` account strkey.
pub fn encode_account(key: &[u8; 32]) -> String {
    encode(StrkeyKind::Account, key)
}

/// Encode a 32-byte contract id as a `C...` strkey.
pub fn encode_contract(id: &[u8; 32]) -> String {
    encode(StrkeyKind::Contract, id)
}

/// Encode a multiplexed account (`M...`). The id is appended big-endian.
pub fn encode_muxed_account(key: &[u8; 32], id: u64) -> String {
    let mut payload = [0u8; 40];
    payload[..32].copy_from_slice(key);
    payload[32..].copy_from_slice(&id.to_be_bytes());
    encode(StrkeyKind::MuxedAccount, &payload)
}

/// Encode a v0 claimable balance id (`B...`).
pub fn encode_claimable_balance(hash: &[u8; 32]) -> String {
    let mut payload = [0u8; 33];
    payload[1..].copy_from_slice(hash);
    encode(StrkeyKind::ClaimableBalance, &payload)
}

/// Encode a liquidity pool id (`L...`).
pub fn encode_liquidity_pool(id: &[u8; 32]) -> String {
    encode(StrkeyKind::LiquidityPool, id)
}

fn to_array(bytes: &[u8]) -> Result<[u8; 32], StrkeyError> {
    bytes.try_into().map_err(|_| StrkeyError::InvalidLength {
        expected: 32,
        actual: bytes.len(),
    })
}

fn encode(kind: StrkeyKind, payload: &[u8]) -> String {
    let mut raw = Vec::with_capacity(payload.len() + 3);
    raw.push(kind.version_byte());
    raw.extend_from_slice(payload);
    let crc = CRC16.checksum(&raw);
    raw.extend_from_slice(&crc.to_le_bytes());
    encode_base32(&raw)
}

/// Decode any supported strkey into its kind and payload bytes.
pub fn decode(s: &str) -> Result<(StrkeyKind, Vec<u8>), StrkeyError> {
    let raw = decode_base32(s)?;
    if raw.len() < 3 {
        return Err(StrkeyError::InvalidLength {
            expected: 3,
            actual: raw.len(),
        });
    }

    let (body, checksum) = raw.split_at(raw.len() - 2);
    let expected = CRC16.checksum(body).to_le_bytes();
    if checksum != expected {
        return Err(StrkeyError::Checksum);
    }

    let kind = StrkeyKind::from_version(body[0]).ok_or(StrkeyError::UnknownVersion(body[0]))?;
    let payload = &body[1..];
    if payload.len() != kind.payload_len() {
        return Err(StrkeyError::InvalidLength {
            expected: kind.payload_len(),
            actual: payload.len(),
        });
    }
    Ok((kind, payload.to_vec()))
}

/// Decode a `G...` strkey to its 32-byte key.
pub fn decode_account(s: &str) -> Result<[u8; 32], StrkeyError> {
    match decode(s)? {
        (StrkeyKind::Account, payload) => to_array(&payload),
        (other, _) => Err(StrkeyError::UnknownVersion(other.version_byte())),
    }
}

fn encode_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}

fn decode_base32(s: &str) -> Result<Vec<u8>, StrkeyError> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for c in s.chars() {
        let val = match c {
            c if c.is_ascii() => BASE32_DECODE[c as usize],
            _ => 0xFF,
        };
        if val == 0xFF {
            return Err(StrkeyError::InvalidChar(c));
        }
        buffer = (buffer << 5) | val as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }

    // Leftover bits must be zero padding, and no more than a partial byte.
    if bits >= 5 || buffer & ((1 << bits) - 1) != 0 {
        return Err(StrkeyError::NonCanonical);
    }
    Ok(out)
}
