use thiserror::Error;

use crate::core::SubTxId;

use super::id::TxParameterId;

/// Failures of typed parameter access.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("mandatory parameter {id} is missing (sub-tx {sub_tx_id})")]
    Missing { id: TxParameterId, sub_tx_id: SubTxId },

    #[error("parameter {id} does not decode to the requested type (sub-tx {sub_tx_id})")]
    Malformed { id: TxParameterId, sub_tx_id: SubTxId },

    #[error("parameter encoding failed: {0}")]
    Codec(#[from] bincode::Error),
}

/// Failures of token and address text decoding.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Neither hex nor base-58, too short, or not a valid address.
    #[error("invalid token or address format")]
    InvalidFormat,

    #[error("buffer does not carry the token marker")]
    NotAToken,

    #[error("sub-transaction index entry does not decode")]
    InvalidSubTxIndex,

    #[error("token codec: {0}")]
    Codec(#[from] bincode::Error),
}
