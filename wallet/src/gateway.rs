//! # Network Gateway
//!
//! What a transaction needs from the outside world: a voucher from the peer
//! it is paying, a node to register the finished transaction with, and the
//! current chain tip.
//!
//! Every call returns immediately. Answers that need a round trip (a peer's
//! voucher, a node's verdict on registration) arrive later: the voucher by
//! the next [`NodeGateway::get_unique_voucher`] call returning `Some`, the
//! registration verdict through `Wallet::on_tx_registered`.

use crate::core::{Height, SubTxId, TxId, WalletId};
use crate::shielded::ShieldedVoucher;
use crate::transaction::kernel::Transaction;

pub trait NodeGateway: Send + Sync {
    /// A voucher reserved for `tx_id` by the owner of `peer`, if it has
    /// arrived. `None` means "ask again later", not failure.
    fn get_unique_voucher(&self, peer: &WalletId, tx_id: &TxId) -> Option<ShieldedVoucher>;

    /// Hand a finished transaction to the node.
    fn register_tx(&self, tx_id: &TxId, sub_tx_id: SubTxId, tx: &Transaction);

    fn tip_height(&self) -> Height;
}
