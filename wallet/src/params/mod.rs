//! # Transaction Parameters
//!
//! Every fact about a transaction in progress lives in a [`TxParameters`]
//! store as an encoded blob keyed by `(sub-tx id, parameter id)`. Typed
//! access happens at the edges through a fixed `bincode` codec, so the
//! store itself never needs to know what a value means.
//!
//! The same store, flattened by [`TxParameters::pack`] and framed as a
//! [`TxToken`], is the payment token wallets exchange and the form the
//! wallet persists.

pub mod codec;
pub mod error;
pub mod id;
pub mod store;
pub mod token;

pub use error::{ParameterError, TokenError};
pub use id::TxParameterId;
pub use store::{PackedTxParameters, TxParameters};
pub use token::{load_receiver_params, parse_parameters, to_token_string, TxToken};
