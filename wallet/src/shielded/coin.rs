use serde::{Deserialize, Serialize};

use crate::core::{Amount, AssetId, TxId};
use crate::crypto::PeerId;

/// Lifecycle of a shielded coin as the wallet sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShieldedCoinStatus {
    /// Created by a transaction that has not landed yet.
    Incoming,
    Available,
    Spent,
}

/// Wallet-side record of a shielded output this wallet can spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldedCoin {
    pub serial_pub: PeerId,
    pub value: Amount,
    pub asset_id: AssetId,
    /// Identity of the sender, if the sender chose to reveal it.
    pub sender: PeerId,
    pub create_tx_id: Option<TxId>,
    pub status: ShieldedCoinStatus,
}
