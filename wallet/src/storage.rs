//! # Wallet Storage
//!
//! The narrow slice of wallet persistence the transaction code needs:
//! address book, transparent and shielded coins, transaction records and
//! their parameter sets.
//!
//! [`WalletDb`] is the contract. [`MemoryWalletDb`] keeps everything in a
//! single `RwLock`-protected state and is what tests and light clients use.
//!
//! | Collection      | Key          | Value                 |
//! |-----------------|--------------|-----------------------|
//! | addresses       | `WalletId`   | `WalletAddress`       |
//! | coins           | `idx`        | `Coin`                |
//! | shielded coins  | `serial_pub` | `ShieldedCoin`        |
//! | transactions    | `TxId`       | `TxDescription`       |
//! | parameters      | `TxId`       | `TxParameters`        |

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::{Amount, AssetId, CoinId, TxId, WalletId};
use crate::crypto::PeerId;
use crate::params::TxParameters;
use crate::shielded::{ShieldedCoin, Viewer};
use crate::transaction::description::TxDescription;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An address book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddress {
    pub wallet_id: WalletId,
    /// Long-term identity the address owner signs vouchers with.
    pub identity: PeerId,
    /// Key index of the address if it is ours, `0` for contacts.
    pub own_id: u64,
    pub label: String,
    pub create_time: DateTime<Utc>,
}

impl WalletAddress {
    pub fn is_own(&self) -> bool {
        self.own_id != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinStatus {
    /// Created by a transaction that has not been registered yet.
    Unavailable,
    Available,
    /// Reserved as an input of a transaction in flight.
    Outgoing,
    /// Change of a transaction in flight.
    Incoming,
    Spent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub id: CoinId,
    pub status: CoinStatus,
    pub create_tx_id: Option<TxId>,
    pub spent_tx_id: Option<TxId>,
}

impl Coin {
    pub fn new(id: CoinId, status: CoinStatus) -> Self {
        Self {
            id,
            status,
            create_tx_id: None,
            spent_tx_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

pub trait WalletDb: Send + Sync {
    fn get_address(&self, id: &WalletId) -> StorageResult<Option<WalletAddress>>;
    fn save_address(&self, address: WalletAddress) -> StorageResult<()>;

    /// Viewer of the wallet owner, used to recognize our own vouchers.
    fn owner_viewer(&self) -> Viewer;

    /// Available coins of `asset_id` worth at least `amount` in total, or
    /// nothing if the wallet cannot cover it.
    fn select_coins(&self, amount: Amount, asset_id: AssetId) -> StorageResult<Vec<Coin>>;
    fn allocate_coin_id(&self) -> StorageResult<u64>;
    fn save_coin(&self, coin: Coin) -> StorageResult<()>;
    fn get_coins(&self) -> StorageResult<Vec<Coin>>;

    fn save_shielded_coin(&self, coin: ShieldedCoin) -> StorageResult<()>;
    fn get_shielded_coins(&self) -> StorageResult<Vec<ShieldedCoin>>;
    /// Returns whether the coin existed.
    fn delete_shielded_coin(&self, serial_pub: &PeerId) -> StorageResult<bool>;

    fn save_tx(&self, tx: &TxDescription) -> StorageResult<()>;
    fn get_tx(&self, id: &TxId) -> StorageResult<Option<TxDescription>>;
    /// Remove the record and its parameters. Returns whether it existed.
    fn delete_tx(&self, id: &TxId) -> StorageResult<bool>;

    fn save_tx_parameters(&self, id: &TxId, params: &TxParameters) -> StorageResult<()>;
    fn load_tx_parameters(&self, id: &TxId) -> StorageResult<Option<TxParameters>>;

    /// Transactions that were in flight when the wallet last stopped.
    fn resumable_txs(&self) -> StorageResult<Vec<TxId>>;
}

// ---------------------------------------------------------------------------
// MemoryWalletDb
// ---------------------------------------------------------------------------

struct MemoryState {
    addresses: HashMap<WalletId, WalletAddress>,
    coins: BTreeMap<u64, Coin>,
    shielded_coins: BTreeMap<PeerId, ShieldedCoin>,
    txs: HashMap<TxId, TxDescription>,
    parameters: HashMap<TxId, TxParameters>,
    next_coin_idx: u64,
}

/// In-memory [`WalletDb`].
pub struct MemoryWalletDb {
    viewer: Viewer,
    state: RwLock<MemoryState>,
}

impl MemoryWalletDb {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            state: RwLock::new(MemoryState {
                addresses: HashMap::new(),
                coins: BTreeMap::new(),
                shielded_coins: BTreeMap::new(),
                txs: HashMap::new(),
                parameters: HashMap::new(),
                next_coin_idx: 1,
            }),
        }
    }

    /// Add an available coin, e.g. one found by scanning the chain.
    pub fn add_available_coin(&self, value: Amount, asset_id: AssetId) -> CoinId {
        let mut state = self.state.write();
        let id = CoinId::new(state.next_coin_idx, value, asset_id);
        state.next_coin_idx += 1;
        state.coins.insert(id.idx, Coin::new(id, CoinStatus::Available));
        id
    }

    /// Sum of available coins of `asset_id`.
    pub fn available(&self, asset_id: AssetId) -> Amount {
        self.state
            .read()
            .coins
            .values()
            .filter(|c| c.status == CoinStatus::Available && c.id.asset_id == asset_id)
            .map(|c| c.id.value)
            .sum()
    }
}

impl WalletDb for MemoryWalletDb {
    fn get_address(&self, id: &WalletId) -> StorageResult<Option<WalletAddress>> {
        Ok(self.state.read().addresses.get(id).cloned())
    }

    fn save_address(&self, address: WalletAddress) -> StorageResult<()> {
        self.state.write().addresses.insert(address.wallet_id, address);
        Ok(())
    }

    fn owner_viewer(&self) -> Viewer {
        self.viewer.clone()
    }

    fn select_coins(&self, amount: Amount, asset_id: AssetId) -> StorageResult<Vec<Coin>> {
        let state = self.state.read();
        let mut candidates: Vec<&Coin> = state
            .coins
            .values()
            .filter(|c| c.status == CoinStatus::Available && c.id.asset_id == asset_id)
            .collect();
        // Largest first keeps the input count low.
        candidates.sort_by(|a, b| b.id.value.cmp(&a.id.value).then(a.id.idx.cmp(&b.id.idx)));

        let mut selected = Vec::new();
        let mut total: Amount = 0;
        for coin in candidates {
            if total >= amount {
                break;
            }
            total = total.saturating_add(coin.id.value);
            selected.push(coin.clone());
        }
        if total < amount {
            return Ok(Vec::new());
        }
        Ok(selected)
    }

    fn allocate_coin_id(&self) -> StorageResult<u64> {
        let mut state = self.state.write();
        let idx = state.next_coin_idx;
        state.next_coin_idx += 1;
        Ok(idx)
    }

    fn save_coin(&self, coin: Coin) -> StorageResult<()> {
        self.state.write().coins.insert(coin.id.idx, coin);
        Ok(())
    }

    fn get_coins(&self) -> StorageResult<Vec<Coin>> {
        Ok(self.state.read().coins.values().cloned().collect())
    }

    fn save_shielded_coin(&self, coin: ShieldedCoin) -> StorageResult<()> {
        self.state.write().shielded_coins.insert(coin.serial_pub, coin);
        Ok(())
    }

    fn get_shielded_coins(&self) -> StorageResult<Vec<ShieldedCoin>> {
        Ok(self.state.read().shielded_coins.values().cloned().collect())
    }

    fn delete_shielded_coin(&self, serial_pub: &PeerId) -> StorageResult<bool> {
        Ok(self.state.write().shielded_coins.remove(serial_pub).is_some())
    }

    fn save_tx(&self, tx: &TxDescription) -> StorageResult<()> {
        self.state.write().txs.insert(tx.tx_id, tx.clone());
        Ok(())
    }

    fn get_tx(&self, id: &TxId) -> StorageResult<Option<TxDescription>> {
        Ok(self.state.read().txs.get(id).cloned())
    }

    fn delete_tx(&self, id: &TxId) -> StorageResult<bool> {
        let mut state = self.state.write();
        state.parameters.remove(id);
        Ok(state.txs.remove(id).is_some())
    }

    fn save_tx_parameters(&self, id: &TxId, params: &TxParameters) -> StorageResult<()> {
        self.state.write().parameters.insert(*id, params.clone());
        Ok(())
    }

    fn load_tx_parameters(&self, id: &TxId) -> StorageResult<Option<TxParameters>> {
        Ok(self.state.read().parameters.get(id).cloned())
    }

    fn resumable_txs(&self) -> StorageResult<Vec<TxId>> {
        let state = self.state.read();
        let mut ids: Vec<TxId> = state
            .txs
            .values()
            .filter(|tx| tx.can_resume())
            .map(|tx| tx.tx_id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}
