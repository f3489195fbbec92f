//! Transaction failure taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Amount, AssetId, Height};
use crate::keykeeper::KeyKeeperError;
use crate::params::{ParameterError, TokenError};
use crate::storage::StorageError;

use super::description::TxType;

/// Persisted reason a transaction ended up `Failed` or `Canceled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxFailureReason {
    #[default]
    Unknown,
    Canceled,
    InvalidState,
    ParameterMissing,
    InvalidFormat,
    NoVouchers,
    KeyKeeperError,
    NotEnoughFunds,
    TransactionExpired,
    FailedToRegister,
    UnsupportedTxType,
    StorageError,
}

impl fmt::Display for TxFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unexpected reason, please send wallet logs to the support",
            Self::Canceled => "transaction was cancelled",
            Self::InvalidState => "transaction is in an invalid state",
            Self::ParameterMissing => "mandatory parameter is missing",
            Self::InvalidFormat => "invalid token or address format",
            Self::NoVouchers => "no vouchers for the receiver",
            Self::KeyKeeperError => "key keeper error",
            Self::NotEnoughFunds => "not enough funds",
            Self::TransactionExpired => "transaction expired",
            Self::FailedToRegister => "failed to register transaction with the node",
            Self::UnsupportedTxType => "unsupported transaction type",
            Self::StorageError => "wallet storage error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum TxError {
    #[error(transparent)]
    ParameterMissing(#[from] ParameterError),

    #[error(transparent)]
    InvalidFormat(#[from] TokenError),

    #[error("no vouchers for the receiver")]
    NoVouchers,

    #[error("key keeper: {0}")]
    KeyKeeper(#[from] KeyKeeperError),

    /// The key keeper answered, but the result does not verify.
    #[error("signed transaction failed its consistency check")]
    ConsistencyCheckFailed,

    #[error("not enough funds: need {required} of asset {asset_id}")]
    NotEnoughFunds { required: Amount, asset_id: AssetId },

    #[error("transaction expired at height {max_height} (tip {tip})")]
    TransactionExpired { max_height: Height, tip: Height },

    #[error("node rejected the transaction")]
    FailedToRegister,

    #[error("unsupported transaction type {0:?}")]
    UnsupportedTxType(TxType),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TxError {
    pub fn reason(&self) -> TxFailureReason {
        match self {
            Self::ParameterMissing(_) => TxFailureReason::ParameterMissing,
            Self::InvalidFormat(_) => TxFailureReason::InvalidFormat,
            Self::NoVouchers => TxFailureReason::NoVouchers,
            Self::KeyKeeper(_) | Self::ConsistencyCheckFailed => TxFailureReason::KeyKeeperError,
            Self::NotEnoughFunds { .. } => TxFailureReason::NotEnoughFunds,
            Self::TransactionExpired { .. } => TxFailureReason::TransactionExpired,
            Self::FailedToRegister => TxFailureReason::FailedToRegister,
            Self::UnsupportedTxType(_) => TxFailureReason::UnsupportedTxType,
            Self::InvalidState(_) => TxFailureReason::InvalidState,
            Self::Storage(_) => TxFailureReason::StorageError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TxParameterId;

    #[test]
    fn consistency_failure_is_reported_as_key_keeper_error() {
        assert_eq!(TxError::ConsistencyCheckFailed.reason(), TxFailureReason::KeyKeeperError);
        assert_eq!(
            TxError::KeyKeeper(KeyKeeperError::UserAbort).reason(),
            TxFailureReason::KeyKeeperError
        );
    }

    #[test]
    fn parameter_errors_map_to_parameter_missing() {
        let err: TxError = ParameterError::Missing {
            id: TxParameterId::AMOUNT,
            sub_tx_id: 1,
        }
        .into();
        assert_eq!(err.reason(), TxFailureReason::ParameterMissing);
        assert!(err.to_string().contains("Amount"));
    }
}
