//! Identifiers shared by every layer of the wallet.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{TX_ID_LENGTH, WALLET_ID_LENGTH};
use crate::crypto::PeerId;

/// Sub-transaction namespace selector.
pub type SubTxId = u32;

/// Asset identifier. `0` is the native coin.
pub type AssetId = u32;

/// Value in the smallest unit.
pub type Amount = u64;

/// Block height.
pub type Height = u64;

/// Errors from parsing identifiers out of text or raw buffers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("buffer of {0} bytes is too long for a wallet id")]
    TooLong(usize),
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Random 64-bit identifier, used for coin ids and address indices.
pub fn get_random_id() -> u64 {
    rand::rngs::OsRng.next_u64()
}

// ---------------------------------------------------------------------------
// CoinId
// ---------------------------------------------------------------------------

/// Identifies a transparent coin. The key keeper derives the coin's
/// blinding factor from all three fields, so the id alone is enough to
/// rebuild its commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoinId {
    pub idx: u64,
    pub value: Amount,
    pub asset_id: AssetId,
}

impl CoinId {
    pub fn new(idx: u64, value: Amount, asset_id: AssetId) -> Self {
        Self { idx, value, asset_id }
    }
}

// ---------------------------------------------------------------------------
// TxId
// ---------------------------------------------------------------------------

/// Transaction identifier. Opaque, fixed size, unique per wallet.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId([u8; TX_ID_LENGTH]);

impl TxId {
    /// Fresh id from a random v4 UUID.
    pub fn generate() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    pub fn from_bytes(bytes: [u8; TX_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TX_ID_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.to_hex())
    }
}

impl FromStr for TxId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| IdError::InvalidHex)?;
        let bytes: [u8; TX_ID_LENGTH] =
            bytes.as_slice().try_into().map_err(|_| IdError::WrongLength {
                expected: TX_ID_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(bytes))
    }
}

// ---------------------------------------------------------------------------
// WalletId
// ---------------------------------------------------------------------------

/// A peer address: message channel plus the peer's public key.
///
/// Field order matters. The derived `Ord` compares the channel first and
/// the key second, which is the order the address book sorts by.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletId {
    pub channel: u32,
    pub pk: PeerId,
}

impl WalletId {
    pub fn new(channel: u32, pk: PeerId) -> Self {
        Self { channel, pk }
    }

    /// A wallet id is usable only if its key decodes to a non-identity point.
    pub fn is_valid(&self) -> bool {
        self.pk.is_valid()
    }

    /// Raw 36-byte form: big-endian channel followed by the key bytes.
    pub fn to_bytes(&self) -> [u8; WALLET_ID_LENGTH] {
        let mut out = [0u8; WALLET_ID_LENGTH];
        out[..4].copy_from_slice(&self.channel.to_be_bytes());
        out[4..].copy_from_slice(self.pk.as_bytes());
        out
    }

    /// Parse the raw form. Shorter buffers are right-aligned, i.e. treated
    /// as if the missing leading bytes were zero.
    pub fn from_buf(buf: &[u8]) -> Result<Self, IdError> {
        if buf.len() > WALLET_ID_LENGTH {
            return Err(IdError::TooLong(buf.len()));
        }
        let mut raw = [0u8; WALLET_ID_LENGTH];
        raw[WALLET_ID_LENGTH - buf.len()..].copy_from_slice(buf);

        let mut channel = [0u8; 4];
        channel.copy_from_slice(&raw[..4]);
        let mut pk = [0u8; 32];
        pk.copy_from_slice(&raw[4..]);
        Ok(Self {
            channel: u32::from_be_bytes(channel),
            pk: PeerId::from_bytes(pk),
        })
    }

    /// Parse the hex text form produced by `Display`.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        // Leading zeros are stripped on output, so the digit count may be odd.
        let padded;
        let s = if s.len() % 2 == 1 {
            padded = format!("0{}", s);
            padded.as_str()
        } else {
            s
        };
        let buf = hex::decode(s).map_err(|_| IdError::InvalidHex)?;
        Self::from_buf(&buf)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = hex::encode(self.to_bytes());
        let trimmed = full.trim_start_matches('0');
        if trimmed.is_empty() {
            f.write_str("0")
        } else {
            f.write_str(trimmed)
        }
    }
}

impl fmt::Debug for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletId({})", self)
    }
}

impl FromStr for WalletId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
