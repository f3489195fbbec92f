//! Parameter identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable integer tag naming one semantic field of a transaction.
///
/// The set is open: a peer running a newer version may send ids this build
/// does not know, and they must survive a decode/encode cycle untouched.
/// That is why this is a newtype over `u32` and not an enum.
///
/// Ids below [`TxParameterId::PRIVATE_FIRST`] may be exchanged with peers.
/// Ids from there on are local bookkeeping and never leave the wallet.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxParameterId(pub u32);

impl TxParameterId {
    pub const TRANSACTION_TYPE: Self = Self(0);
    pub const IS_SENDER: Self = Self(1);
    pub const AMOUNT: Self = Self(2);
    pub const FEE: Self = Self(3);
    pub const MIN_HEIGHT: Self = Self(4);
    pub const MESSAGE: Self = Self(5);
    pub const MY_ID: Self = Self(6);
    pub const PEER_ID: Self = Self(7);
    pub const CREATE_TIME: Self = Self(10);
    pub const IS_INITIATOR: Self = Self(11);
    pub const LIFETIME: Self = Self(15);
    pub const MAX_HEIGHT: Self = Self(17);
    pub const ASSET_ID: Self = Self(18);
    pub const MY_WALLET_IDENTITY: Self = Self(20);
    pub const PEER_WALLET_IDENTITY: Self = Self(21);
    pub const MY_ADDRESS_ID: Self = Self(22);
    pub const PEER_OWN_ID: Self = Self(23);
    pub const IS_SELF_TX: Self = Self(24);
    /// Reserved control tag. In packed form it switches the sub-transaction
    /// that subsequent entries belong to. It is never stored.
    pub const SUB_TX_INDEX: Self = Self(25);
    pub const SHIELDED_VOUCHER_LIST: Self = Self(26);
    pub const PAYMENT_CONFIRMATION: Self = Self(27);

    pub const PRIVATE_FIRST: Self = Self(128);

    pub const STATUS: Self = Self(128);
    pub const KERNEL_ID: Self = Self(129);
    pub const FAILURE_REASON: Self = Self(130);
    pub const MODIFY_TIME: Self = Self(131);
    pub const INPUT_COINS: Self = Self(132);
    pub const OUTPUT_COINS: Self = Self(133);
    pub const CHANGE: Self = Self(134);
    pub const INPUTS: Self = Self(135);
    pub const OUTPUTS: Self = Self(136);
    pub const KERNEL: Self = Self(137);
    pub const OFFSET: Self = Self(138);
    pub const UNUSED_SHIELDED_VOUCHER_LIST: Self = Self(139);
    pub const SHIELDED_SERIAL_PUB: Self = Self(140);
    pub const TRANSACTION_REGISTERED: Self = Self(141);
    pub const KERNEL_PROOF_HEIGHT: Self = Self(142);

    /// Whether this id is local-only bookkeeping.
    pub fn is_private(self) -> bool {
        self >= Self::PRIVATE_FIRST
    }

    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::TRANSACTION_TYPE => "TransactionType",
            Self::IS_SENDER => "IsSender",
            Self::AMOUNT => "Amount",
            Self::FEE => "Fee",
            Self::MIN_HEIGHT => "MinHeight",
            Self::MESSAGE => "Message",
            Self::MY_ID => "MyID",
            Self::PEER_ID => "PeerID",
            Self::CREATE_TIME => "CreateTime",
            Self::IS_INITIATOR => "IsInitiator",
            Self::LIFETIME => "Lifetime",
            Self::MAX_HEIGHT => "MaxHeight",
            Self::ASSET_ID => "AssetID",
            Self::MY_WALLET_IDENTITY => "MyWalletIdentity",
            Self::PEER_WALLET_IDENTITY => "PeerWalletIdentity",
            Self::MY_ADDRESS_ID => "MyAddressID",
            Self::PEER_OWN_ID => "PeerOwnID",
            Self::IS_SELF_TX => "IsSelfTx",
            Self::SUB_TX_INDEX => "SubTxIndex",
            Self::SHIELDED_VOUCHER_LIST => "ShieldedVoucherList",
            Self::PAYMENT_CONFIRMATION => "PaymentConfirmation",
            Self::STATUS => "Status",
            Self::KERNEL_ID => "KernelID",
            Self::FAILURE_REASON => "FailureReason",
            Self::MODIFY_TIME => "ModifyTime",
            Self::INPUT_COINS => "InputCoins",
            Self::OUTPUT_COINS => "OutputCoins",
            Self::CHANGE => "Change",
            Self::INPUTS => "Inputs",
            Self::OUTPUTS => "Outputs",
            Self::KERNEL => "Kernel",
            Self::OFFSET => "Offset",
            Self::UNUSED_SHIELDED_VOUCHER_LIST => "UnusedShieldedVoucherList",
            Self::SHIELDED_SERIAL_PUB => "ShieldedSerialPub",
            Self::TRANSACTION_REGISTERED => "TransactionRegistered",
            Self::KERNEL_PROOF_HEIGHT => "KernelProofHeight",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for TxParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "#{}", self.0),
        }
    }
}

impl fmt::Debug for TxParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self, self.0)
    }
}
