//! # Core Vocabulary
//!
//! Identifiers and scalar types every other module speaks in: transaction
//! ids, wallet addresses, sub-transaction and asset ids, amounts, heights,
//! and the display adapter for amounts.

pub mod amount;
pub mod ids;

pub use amount::PrintableAmount;
pub use ids::{get_random_id, Amount, AssetId, CoinId, Height, IdError, SubTxId, TxId, WalletId};

pub use crate::crypto::PeerId;
