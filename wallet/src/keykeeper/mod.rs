//! # Key Keeper
//!
//! The key keeper is the only component that holds secret scalars. The
//! transaction code asks it to do things (build an output, issue a voucher,
//! sign a kernel) through [`Method`] requests and gets back public results.
//!
//! Two ways in:
//!
//! - [`PrivateKeyKeeper::invoke_sync`] for requests that are always
//!   answerable on the spot.
//! - [`PrivateKeyKeeper::invoke_async`] for requests that may need a slow
//!   signer, e.g. a hardware device waiting for the user. The answer is
//!   delivered through a [`KeyKeeperHandler`].
//!
//! A handler delivers exactly one [`KeyKeeperEvent`] to the wallet's event
//! channel. Completing it consumes it, so a second completion does not
//! compile; dropping it without completing delivers an `Unspecified`
//! failure, so a keeper that loses a request cannot leave a transaction
//! waiting forever.

pub mod local;
pub mod method;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::core::{SubTxId, TxId};

pub use local::LocalKeyKeeper;
pub use method::{
    CreateOutput, CreateVoucherShielded, GetCommitment, Method, ShieldedUserData, SignSendShielded,
    TxCommon,
};

/// Status codes a key keeper can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyKeeperError {
    #[error("operation rejected by the user")]
    UserAbort,
    #[error("method not implemented by this key keeper")]
    NotImplemented,
    #[error("voucher is not signed by the peer")]
    InvalidVoucher,
    #[error("identity key does not belong to this wallet")]
    UnknownIdentity,
    #[error("inputs and outputs do not balance")]
    Unbalanced,
    #[error("unspecified key keeper failure")]
    Unspecified,
}

/// Completion of one asynchronous invocation.
#[derive(Debug)]
pub struct KeyKeeperEvent {
    pub tx_id: TxId,
    pub sub_tx_id: SubTxId,
    /// Generation of the transaction at the time of the request.
    pub generation: u64,
    pub result: Result<Method, KeyKeeperError>,
}

/// One-shot reply slot for [`PrivateKeyKeeper::invoke_async`].
#[derive(Debug)]
pub struct KeyKeeperHandler {
    tx_id: TxId,
    sub_tx_id: SubTxId,
    generation: u64,
    reply: Option<UnboundedSender<KeyKeeperEvent>>,
}

impl KeyKeeperHandler {
    pub fn new(
        tx_id: TxId,
        sub_tx_id: SubTxId,
        generation: u64,
        reply: UnboundedSender<KeyKeeperEvent>,
    ) -> Self {
        Self {
            tx_id,
            sub_tx_id,
            generation,
            reply: Some(reply),
        }
    }

    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    /// Deliver the result. Consumes the handler.
    pub fn complete(mut self, result: Result<Method, KeyKeeperError>) {
        self.send(result);
    }

    fn send(&mut self, result: Result<Method, KeyKeeperError>) {
        let Some(reply) = self.reply.take() else {
            return;
        };
        let event = KeyKeeperEvent {
            tx_id: self.tx_id,
            sub_tx_id: self.sub_tx_id,
            generation: self.generation,
            result,
        };
        if reply.send(event).is_err() {
            debug!(tx_id = %self.tx_id, "wallet is gone, dropping key keeper result");
        }
    }
}

impl Drop for KeyKeeperHandler {
    fn drop(&mut self) {
        if self.reply.is_some() {
            warn!(tx_id = %self.tx_id, sub_tx_id = self.sub_tx_id, "key keeper dropped a request");
            self.send(Err(KeyKeeperError::Unspecified));
        }
    }
}

/// The signer contract.
pub trait PrivateKeyKeeper: Send + Sync {
    /// Run `method` to completion, filling in its outputs.
    fn invoke_sync(&self, method: &mut Method) -> Result<(), KeyKeeperError>;

    /// Start `method` and report through `handler`, now or later.
    fn invoke_async(&self, mut method: Method, handler: KeyKeeperHandler) {
        let result = self.invoke_sync(&mut method).map(|()| method);
        handler.complete(result);
    }
}
