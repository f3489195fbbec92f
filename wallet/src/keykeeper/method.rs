//! Requests the key keeper understands.
//!
//! Each method is a struct with input fields the caller fills in and output
//! fields the key keeper fills on success. Outputs start out empty.

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

use crate::core::{Amount, AssetId, CoinId, Height};
use crate::crypto::{HashValue, PeerId};
use crate::shielded::{ShieldedVoucher, ShieldedVoucherList};
use crate::transaction::kernel::{Output, TxKernel};

/// Commitment of a coin the key keeper can rebuild from its id.
#[derive(Debug, Clone)]
pub struct GetCommitment {
    pub coin_id: CoinId,
    pub result: Option<CompressedRistretto>,
}

/// Build a transaction output for a new coin.
#[derive(Debug, Clone)]
pub struct CreateOutput {
    pub coin_id: CoinId,
    pub result: Option<Output>,
}

/// Issue vouchers for one of this wallet's own addresses.
#[derive(Debug, Clone)]
pub struct CreateVoucherShielded {
    /// Index of the owned address the vouchers are issued for. Zero is
    /// never an owned address.
    pub my_id_key: u64,
    pub nonce: HashValue,
    pub count: u32,
    pub result: ShieldedVoucherList,
}

/// Shape of the transaction the kernel is built for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCommon {
    pub inputs: Vec<CoinId>,
    pub outputs: Vec<CoinId>,
    pub fee: Amount,
    pub min_height: Height,
    pub max_height: Height,
}

/// Data the sender attaches to a shielded output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldedUserData {
    /// Sender's wallet identity. All zeros when the sender stays anonymous.
    pub sender: PeerId,
}

/// Build and sign the kernel of a shielded send.
#[derive(Debug, Clone)]
pub struct SignSendShielded {
    pub common: TxCommon,
    pub value: Amount,
    pub asset_id: AssetId,
    /// Wallet identity of the receiver. The voucher must be signed by it.
    pub peer: PeerId,
    pub voucher: ShieldedVoucher,
    pub user: ShieldedUserData,
    /// Set when the receiver is one of our own addresses.
    pub my_id_key: Option<u64>,

    pub kernel: Option<TxKernel>,
    pub offset: Scalar,
}

impl SignSendShielded {
    pub fn new(common: TxCommon, value: Amount, asset_id: AssetId, peer: PeerId, voucher: ShieldedVoucher) -> Self {
        Self {
            common,
            value,
            asset_id,
            peer,
            voucher,
            user: ShieldedUserData::default(),
            my_id_key: None,
            kernel: None,
            offset: Scalar::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Method {
    GetCommitment(GetCommitment),
    CreateOutput(CreateOutput),
    CreateVoucherShielded(CreateVoucherShielded),
    SignSendShielded(Box<SignSendShielded>),
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::GetCommitment(_) => "GetCommitment",
            Method::CreateOutput(_) => "CreateOutput",
            Method::CreateVoucherShielded(_) => "CreateVoucherShielded",
            Method::SignSendShielded(_) => "SignSendShielded",
        }
    }
}
