//! # Wallet Loop
//!
//! [`Wallet`] owns every live transaction of a session and is the only
//! place they are mutated from. It is cooperative, not threaded: the owner
//! calls [`Wallet::update_all`] when the chain moves, [`Wallet::next_event`]
//! (or [`Wallet::process_events`]) to deliver key keeper completions, and
//! [`Wallet::on_tx_registered`] when the node answers.
//!
//! ## Stale completions
//!
//! Each transaction object carries a generation taken from a session-wide
//! counter. The counter is bumped when a transaction is created, resumed or
//! canceled, and every key keeper request is stamped with the generation
//! current at the time. A completion is delivered only if its transaction is
//! still live, not terminal, and on the same generation. Anything else is
//! logged and dropped.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::core::{TxId, WalletId};
use crate::keykeeper::KeyKeeperEvent;
use crate::params::{TxParameterId, TxParameters};
use crate::storage::StorageError;
use crate::transaction::{
    PushTransaction, TxContext, TxDescription, TxError, TxStatus, TxType, WalletServices,
};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Tx(#[from] TxError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("transaction {0} not found")]
    NotFound(TxId),

    #[error("transaction {0} already exists")]
    AlreadyExists(TxId),

    #[error("transaction {0} cannot be canceled in its current state")]
    CannotCancel(TxId),

    #[error("transaction {0} cannot be deleted in its current state")]
    CannotDelete(TxId),
}

pub struct Wallet {
    services: WalletServices,
    transactions: HashMap<TxId, PushTransaction>,
    events_tx: UnboundedSender<KeyKeeperEvent>,
    events_rx: UnboundedReceiver<KeyKeeperEvent>,
    generation: u64,
}

impl Wallet {
    pub fn new(services: WalletServices) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            services,
            transactions: HashMap::new(),
            events_tx,
            events_rx,
            generation: 0,
        }
    }

    pub fn services(&self) -> &WalletServices {
        &self.services
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Start sending with `params` (typically parsed from a token or an
    /// address) and run the first update.
    pub fn start_push_transaction(&mut self, mut params: TxParameters) -> Result<TxId, WalletError> {
        if let Some(tx_type) = params.get::<TxType>(TxParameterId::TRANSACTION_TYPE) {
            if tx_type != TxType::PushTransaction {
                return Err(TxError::UnsupportedTxType(tx_type).into());
            }
        }

        let tx_id = params.tx_id().unwrap_or_else(TxId::generate);
        if self.transactions.contains_key(&tx_id) || self.services.db.get_tx(&tx_id)?.is_some() {
            return Err(WalletError::AlreadyExists(tx_id));
        }

        let self_tx = match params.get::<WalletId>(TxParameterId::PEER_ID) {
            Some(peer) => self
                .services
                .db
                .get_address(&peer)?
                .map(|a| a.is_own())
                .unwrap_or(false),
            None => false,
        };

        params.set_tx_id(tx_id);
        params
            .set(TxParameterId::TRANSACTION_TYPE, &TxType::PushTransaction)
            .set(TxParameterId::IS_SENDER, &true)
            .set(TxParameterId::IS_INITIATOR, &true)
            .set(TxParameterId::IS_SELF_TX, &self_tx)
            .set(TxParameterId::CREATE_TIME, &Utc::now().timestamp())
            .set(TxParameterId::STATUS, &TxStatus::Pending);
        self.services.db.save_tx_parameters(&tx_id, &params)?;

        let generation = self.next_generation();
        let ctx = TxContext::new(tx_id, params, self.services.clone(), self.events_tx.clone(), generation);
        let mut tx = PushTransaction::new(ctx);
        self.services.db.save_tx(&tx.description())?;
        info!(tx_id = %tx_id, self_tx, "push transaction created");

        tx.update();
        self.transactions.insert(tx_id, tx);
        Ok(tx_id)
    }

    pub fn update(&mut self, tx_id: &TxId) -> Result<(), WalletError> {
        let tx = self
            .transactions
            .get_mut(tx_id)
            .ok_or(WalletError::NotFound(*tx_id))?;
        tx.update();
        Ok(())
    }

    pub fn update_all(&mut self) {
        for tx in self.transactions.values_mut() {
            tx.update();
        }
    }

    /// Deliver every completion already queued. Returns how many were read.
    pub fn process_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            count += 1;
        }
        count
    }

    /// Wait for the next completion and deliver it.
    pub async fn next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, event: KeyKeeperEvent) {
        let Some(tx) = self.transactions.get_mut(&event.tx_id) else {
            debug!(tx_id = %event.tx_id, "completion for an unknown transaction, ignoring");
            return;
        };
        if tx.generation() != event.generation {
            warn!(
                tx_id = %event.tx_id,
                event_generation = event.generation,
                generation = tx.generation(),
                "stale key keeper completion, ignoring"
            );
            return;
        }
        if tx.status().is_terminal() {
            debug!(tx_id = %event.tx_id, status = ?tx.status(), "completion for a finished transaction, ignoring");
            return;
        }
        debug!(tx_id = %event.tx_id, sub_tx_id = event.sub_tx_id, "key keeper completion");
        tx.on_key_keeper_event(event.result);
    }

    /// The node accepted or rejected a transaction it was sent.
    pub fn on_tx_registered(&mut self, tx_id: &TxId, accepted: bool) -> Result<(), WalletError> {
        let tx = self
            .transactions
            .get_mut(tx_id)
            .ok_or(WalletError::NotFound(*tx_id))?;
        tx.on_registered(accepted);
        Ok(())
    }

    pub fn cancel_tx(&mut self, tx_id: &TxId) -> Result<(), WalletError> {
        let generation = self.next_generation();
        let tx = self
            .transactions
            .get_mut(tx_id)
            .ok_or(WalletError::NotFound(*tx_id))?;
        if !tx.description().can_cancel() {
            return Err(WalletError::CannotCancel(*tx_id));
        }
        // Completions already in flight now carry an old generation.
        tx.set_generation(generation);
        tx.cancel()?;
        info!(tx_id = %tx_id, "transaction canceled");
        Ok(())
    }

    pub fn delete_tx(&mut self, tx_id: &TxId) -> Result<(), WalletError> {
        let desc = self.description(tx_id)?;
        if !desc.can_delete() {
            return Err(WalletError::CannotDelete(*tx_id));
        }
        self.transactions.remove(tx_id);
        self.services.db.delete_tx(tx_id)?;
        info!(tx_id = %tx_id, "transaction deleted");
        Ok(())
    }

    /// Reload transactions that were in flight when the wallet stopped.
    /// Returns how many were resumed.
    pub fn resume_transactions(&mut self) -> Result<usize, WalletError> {
        let mut resumed = 0;
        for tx_id in self.services.db.resumable_txs()? {
            if self.transactions.contains_key(&tx_id) {
                continue;
            }
            let Some(params) = self.services.db.load_tx_parameters(&tx_id)? else {
                warn!(tx_id = %tx_id, "no parameters stored, cannot resume");
                continue;
            };
            let generation = self.next_generation();
            let ctx = TxContext::new(tx_id, params, self.services.clone(), self.events_tx.clone(), generation);
            let mut tx = PushTransaction::new(ctx);
            tx.update();
            self.transactions.insert(tx_id, tx);
            resumed += 1;
        }
        if resumed > 0 {
            info!(resumed, "transactions resumed");
        }
        Ok(resumed)
    }

    pub fn description(&self, tx_id: &TxId) -> Result<TxDescription, WalletError> {
        if let Some(tx) = self.transactions.get(tx_id) {
            return Ok(tx.description());
        }
        self.services
            .db
            .get_tx(tx_id)?
            .ok_or(WalletError::NotFound(*tx_id))
    }

    pub fn transaction(&self, tx_id: &TxId) -> Option<&PushTransaction> {
        self.transactions.get(tx_id)
    }
}
