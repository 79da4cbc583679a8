//! Classic asset identity and its Stellar Asset Contract id.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    AccountId, AlphaNum12, AlphaNum4, Asset, AssetCode12, AssetCode4, ContractIdPreimage, Hash,
    HashIdPreimage, HashIdPreimageContractId, Limits, PublicKey, Uint256, WriteXdr,
};
use thiserror::Error;

use crate::strkey::{self, StrkeyError};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset descriptor must be CODE:ISSUER, got {0:?}")]
    Descriptor(String),

    #[error("asset code must be 1-12 ASCII alphanumerics, got {0:?}")]
    Code(String),

    #[error("invalid issuer {issuer:?}: {source}")]
    Issuer {
        issuer: String,
        #[source]
        source: StrkeyError,
    },

    #[error("XDR encoding failed: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
}

// ─── Network ──────────────────────────────────────────────────────────────────

/// A Stellar network, identified by its passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Pubnet,
    Futurenet,
    Custom(String),
}

impl Network {
    pub const TESTNET_PASSPHRASE: &'static str = "Test SDF Network ; September 2015";
    pub const PUBNET_PASSPHRASE: &'static str = "Public Global Stellar Network ; September 2015";
    pub const FUTURENET_PASSPHRASE: &'static str = "Test SDF Future Network ; October 2022";

    pub fn passphrase(&self) -> &str {
        match self {
            Self::Testnet => Self::TESTNET_PASSPHRASE,
            Self::Pubnet => Self::PUBNET_PASSPHRASE,
            Self::Futurenet => Self::FUTURENET_PASSPHRASE,
            Self::Custom(p) => p,
        }
    }

    /// `sha256(passphrase)`.
    pub fn network_id(&self) -> [u8; 32] {
        Sha256::digest(self.passphrase().as_bytes()).into()
    }
}

impl FromStr for Network {
    type Err = std::convert::Infallible;

    /// Accepts a well-known name, or treats the input as a passphrase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "testnet" | "test" => Self::Testnet,
            "pubnet" | "public" | "mainnet" => Self::Pubnet,
            "futurenet" => Self::Futurenet,
            _ => match s {
                Self::TESTNET_PASSPHRASE => Self::Testnet,
                Self::PUBNET_PASSPHRASE => Self::Pubnet,
                Self::FUTURENET_PASSPHRASE => Self::Futurenet,
                other => Self::Custom(other.to_string()),
            },
        })
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testnet => f.write_str("testnet"),
            Self::Pubnet => f.write_str("pubnet"),
            Self::Futurenet => f.write_str("futurenet"),
            Self::Custom(p) => write!(f, "custom ({p})"),
        }
    }
}

// ─── AssetIdentity ────────────────────────────────────────────────────────────

/// A classic credit asset: code plus issuing account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetIdentity {
    code: String,
    issuer: String,
    issuer_key: [u8; 32],
}

impl AssetIdentity {
    pub fn new(code: impl Into<String>, issuer: impl Into<String>) -> Result<Self, AssetError> {
        let code = code.into();
        let issuer = issuer.into();

        if code.is_empty() || code.len() > 12 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(AssetError::Code(code));
        }
        let issuer_key = strkey::decode_account(&issuer).map_err(|source| AssetError::Issuer {
            issuer: issuer.clone(),
            source,
        })?;

        Ok(Self {
            code,
            issuer,
            issuer_key,
        })
    }

    /// Parse a `CODE:ISSUER` descriptor.
    pub fn parse(descriptor: &str) -> Result<Self, AssetError> {
        match descriptor.split_once(':') {
            Some((code, issuer)) if !issuer.contains(':') => Self::new(code, issuer),
            _ => Err(AssetError::Descriptor(descriptor.to_string())),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// `code:issuer`, the form asset events carry as their third topic.
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.code, self.issuer)
    }

    /// XDR asset: alphanum4 for codes up to four characters, else alphanum12.
    pub fn to_xdr_asset(&self) -> Asset {
        let issuer = AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(self.issuer_key)));
        let bytes = self.code.as_bytes();
        if bytes.len() <= 4 {
            let mut code = [0u8; 4];
            code[..bytes.len()].copy_from_slice(bytes);
            Asset::CreditAlphanum4(AlphaNum4 {
                asset_code: AssetCode4(code),
                issuer,
            })
        } else {
            let mut code = [0u8; 12];
            code[..bytes.len()].copy_from_slice(bytes);
            Asset::CreditAlphanum12(AlphaNum12 {
                asset_code: AssetCode12(code),
                issuer,
            })
        }
    }

    /// The asset's contract id on `network`:
    /// `sha256(XDR(HashIdPreimage::ContractId { network_id, FromAsset(asset) }))`.
    pub fn contract_id(&self, network: &Network) -> Result<[u8; 32], AssetError> {
        let preimage = HashIdPreimage::ContractId(HashIdPreimageContractId {
            network_id: Hash(network.network_id()),
            contract_id_preimage: ContractIdPreimage::Asset(self.to_xdr_asset()),
        });
        let xdr = preimage.to_xdr(Limits::none())?;
        Ok(Sha256::digest(&xdr).into())
    }

    /// [`contract_id`](Self::contract_id) as a `C...` strkey.
    pub fn contract_strkey(&self, network: &Network) -> Result<String, AssetError> {
        Ok(strkey::encode_contract(&self.contract_id(network)?))
    }
}

impl FromStr for AssetIdentity {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AssetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.code, self.issuer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIFO_ISSUER: &str = "GC66GVXUBUONBFLHFA7QBB2RU7HK3XT5AYM5ZZSIIG2XCYDGHXRDKUKE";
    const USDC_ISSUER: &str = "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN";

    #[test]
    fn network_ids_hash_passphrase() {
        assert_eq!(
            hex::encode(Network::Pubnet.network_id()),
            "7ac33997544e3175d266bd022439b22cdb16508c01163f26e5cb2a3e1045a979"
        );
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!(
            Network::PUBNET_PASSPHRASE.parse::<Network>().unwrap(),
            Network::Pubnet
        );
        assert_eq!(
            "Standalone Network ; February 2017".parse::<Network>().unwrap(),
            Network::Custom("Standalone Network ; February 2017".into())
        );
    }

    #[test]
    fn fifo_testnet_contract_id() {
        let asset = AssetIdentity::parse(&format!("fifo:{FIFO_ISSUER}")).unwrap();
        assert_eq!(
            hex::encode(asset.contract_id(&Network::Testnet).unwrap()),
            "ed91bf84c17fdcd7c4230694cd2d56e766b164f4cd3a8500d9e5c0a68889d3b6"
        );
        assert_eq!(
            asset.contract_strkey(&Network::Testnet).unwrap(),
            "CDWZDP4EYF75ZV6EEMDJJTJNK3TWNMLE6TGTVBIA3HS4BJUIRHJ3MLMG"
        );
    }

    #[test]
    fn usdc_pubnet_contract_id() {
        let asset = AssetIdentity::new("USDC", USDC_ISSUER).unwrap();
        assert_eq!(
            asset.contract_strkey(&Network::Pubnet).unwrap(),
            "CCW67TSZV3SSS2HXMBQ5JFGCKJNXKZM7UQUWUZPUTHXSTZLEO7SJMI75"
        );
    }

    #[test]
    fn long_codes_use_alphanum12() {
        let asset = AssetIdentity::new("LONGASSET", FIFO_ISSUER).unwrap();
        assert!(matches!(asset.to_xdr_asset(), Asset::CreditAlphanum12(_)));
        assert_eq!(
            asset.contract_strkey(&Network::Testnet).unwrap(),
            "CA73YJGA4TP32SUDR4OB7NPOLIDK4E5NOWL3AESB25VXF6CZHM5WUS7P"
        );
    }

    #[test]
    fn canonical_form() {
        let asset = AssetIdentity::new("fifo", FIFO_ISSUER).unwrap();
        assert_eq!(asset.canonical(), format!("fifo:{FIFO_ISSUER}"));
        assert_eq!(asset.to_string(), asset.canonical());
    }

    #[test]
    fn rejects_bad_descriptors() {
        assert!(matches!(AssetIdentity::parse("fifo"), Err(AssetError::Descriptor(_))));
        assert!(matches!(
            AssetIdentity::new("", FIFO_ISSUER),
            Err(AssetError::Code(_))
        ));
        assert!(matches!(
            AssetIdentity::new("THIRTEENCHARS", FIFO_ISSUER),
            Err(AssetError::Code(_))
        ));
        assert!(matches!(
            AssetIdentity::new("fi-fo", FIFO_ISSUER),
            Err(AssetError::Code(_))
        ));
        assert!(matches!(
            AssetIdentity::new("fifo", "GNOTAKEY"),
            Err(AssetError::Issuer { .. })
        ));
    }
}
