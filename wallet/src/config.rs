//! # Wallet Configuration & Constants
//!
//! Every magic number the wallet core depends on lives here, next to the
//! [`Rules`] table that carries the chain parameters.
//!
//! The constants below are wire-compatibility contracts. The token flag, the
//! raw-address length and the token length threshold are what older
//! address-only clients rely on when they hand us a string, so they do not
//! move once released.
//!
//! [`Rules`] is deliberately not a global. Whoever builds a wallet loads (or
//! defaults) one and threads it through as an `Arc<Rules>`.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Token Format
// ---------------------------------------------------------------------------

/// Top bit of the first byte of a serialized token. A buffer whose first
/// byte carries this bit (and which is long enough) is a token, not a raw
/// wallet address.
pub const TOKEN_FLAG: u8 = 0x80;

/// Buffers must be strictly longer than this to be considered as a token.
/// A 33-byte buffer is always read as an address, even with the flag bit set.
pub const TOKEN_MIN_LENGTH_EXCLUSIVE: usize = 33;

/// Shortest decoded text buffer we are willing to look at.
pub const MIN_PARSE_BUFFER_LENGTH: usize = 2;

/// Size of a serialized wallet address: 4 channel bytes + 32 key bytes.
pub const WALLET_ID_LENGTH: usize = 36;

/// Size of a transaction id in bytes.
pub const TX_ID_LENGTH: usize = 16;

/// Upper bound on any single encoded parameter value or token frame. Keeps a
/// hostile length prefix from turning into a giant allocation.
pub const MAX_ENCODED_LENGTH: u64 = 1 << 20;

// ---------------------------------------------------------------------------
// Sub-transactions
// ---------------------------------------------------------------------------

/// Sub-transaction namespace of the primary transaction.
pub const DEFAULT_SUB_TX_ID: u32 = 1;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Chain parameters read by fee computation, amount formatting and kernel-id
/// derivation.
///
/// Treat this as a read-only table: load it once at startup and share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Smallest units ("groth") per whole coin.
    pub coin: u64,
    /// Minimum fee contribution per transaction output.
    pub min_fee_per_output: u64,
    /// Minimum fee contribution per kernel.
    pub min_fee_per_kernel: u64,
    /// Extra fee charged for every shielded output.
    pub shielded_output_fee: u64,
    /// Default validity window of a transaction, in blocks.
    pub default_lifetime: u64,
    /// Network tag mixed into kernel ids so kernels signed for one network
    /// never validate on another.
    pub chain_tag: String,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            coin: 100_000_000,
            min_fee_per_output: 10,
            min_fee_per_kernel: 10,
            shielded_output_fee: 1_000,
            default_lifetime: 120,
            chain_tag: "nova-mainnet".to_string(),
        }
    }
}

impl Rules {
    /// Parse a JSON rules table. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("malformed rules table")
    }

    /// Load a JSON rules table from disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rules from {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Minimum fee for a transaction with the given shape.
    pub fn minimum_fee(&self, outputs: usize, kernels: usize) -> u64 {
        outputs as u64 * self.min_fee_per_output + kernels as u64 * self.min_fee_per_kernel
    }

    /// Default fee for a push transaction: one change output, one kernel and
    /// one shielded output.
    pub fn default_push_fee(&self) -> u64 {
        self.minimum_fee(1, 1) + self.shielded_output_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn token_threshold_is_below_address_length() {
        // Lengths 34..=36 are ambiguous; the flag byte decides for them.
        assert!(TOKEN_MIN_LENGTH_EXCLUSIVE < WALLET_ID_LENGTH);
        assert_eq!(TOKEN_FLAG.leading_zeros(), 0);
    }

    #[test]
    fn minimum_fee_matches_ten_per_item() {
        let rules = Rules::default();
        assert_eq!(rules.minimum_fee(2, 1), 30);
        assert_eq!(rules.minimum_fee(0, 0), 0);
        assert_eq!(rules.default_push_fee(), 1_020);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let rules = Rules::from_json_str(r#"{ "coin": 1000, "chain_tag": "nova-devnet" }"#).unwrap();
        assert_eq!(rules.coin, 1000);
        assert_eq!(rules.chain_tag, "nova-devnet");
        assert_eq!(rules.default_lifetime, Rules::default().default_lifetime);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(Rules::from_json_str("{ coin: ").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "shielded_output_fee": 5 }}"#).unwrap();
        let rules = Rules::load(file.path()).unwrap();
        assert_eq!(rules.shielded_output_fee, 5);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = Rules::load("/definitely/not/here.json").unwrap_err();
        assert!(format!("{:#}", err).contains("/definitely/not/here.json"));
    }
}
