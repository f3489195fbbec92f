//! Per-transaction execution context.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::{Rules, DEFAULT_SUB_TX_ID};
use crate::core::{SubTxId, TxId};
use crate::gateway::NodeGateway;
use crate::keykeeper::{KeyKeeperEvent, KeyKeeperHandler, PrivateKeyKeeper};
use crate::params::{TxParameterId, TxParameters};
use crate::storage::WalletDb;

use super::error::TxError;

/// The collaborators a wallet session shares with all its transactions.
#[derive(Clone)]
pub struct WalletServices {
    pub db: Arc<dyn WalletDb>,
    pub gateway: Arc<dyn NodeGateway>,
    pub key_keeper: Arc<dyn PrivateKeyKeeper>,
    pub rules: Arc<Rules>,
}

/// A transaction's parameters plus the services it runs against.
///
/// Every write goes to the in-memory parameter set and is persisted
/// straight away, so a restarted wallet resumes from the last step that
/// completed.
pub struct TxContext {
    tx_id: TxId,
    params: TxParameters,
    services: WalletServices,
    events: UnboundedSender<KeyKeeperEvent>,
    generation: u64,
}

impl TxContext {
    pub fn new(
        tx_id: TxId,
        mut params: TxParameters,
        services: WalletServices,
        events: UnboundedSender<KeyKeeperEvent>,
        generation: u64,
    ) -> Self {
        params.set_tx_id(tx_id);
        Self {
            tx_id,
            params,
            services,
            events,
            generation,
        }
    }

    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    pub fn params(&self) -> &TxParameters {
        &self.params
    }

    pub fn services(&self) -> &WalletServices {
        &self.services
    }

    pub fn db(&self) -> &dyn WalletDb {
        self.services.db.as_ref()
    }

    pub fn gateway(&self) -> &dyn NodeGateway {
        self.services.gateway.as_ref()
    }

    pub fn key_keeper(&self) -> &dyn PrivateKeyKeeper {
        self.services.key_keeper.as_ref()
    }

    pub fn rules(&self) -> &Rules {
        &self.services.rules
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Reply slot for an asynchronous key keeper call made on behalf of
    /// `sub_tx_id`.
    pub fn handler(&self, sub_tx_id: SubTxId) -> KeyKeeperHandler {
        KeyKeeperHandler::new(self.tx_id, sub_tx_id, self.generation, self.events.clone())
    }

    pub fn get<T: DeserializeOwned>(&self, id: TxParameterId) -> Option<T> {
        self.params.get(id)
    }

    pub fn get_sub<T: DeserializeOwned>(&self, id: TxParameterId, sub_tx_id: SubTxId) -> Option<T> {
        self.params.get_sub(id, sub_tx_id)
    }

    pub fn get_mandatory<T: DeserializeOwned>(&self, id: TxParameterId) -> Result<T, TxError> {
        Ok(self.params.get_mandatory(id)?)
    }

    pub fn contains(&self, id: TxParameterId, sub_tx_id: SubTxId) -> bool {
        self.params.contains(id, sub_tx_id)
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, id: TxParameterId, value: &T) -> Result<(), TxError> {
        self.set_sub(id, value, DEFAULT_SUB_TX_ID)
    }

    pub fn set_sub<T: Serialize + ?Sized>(
        &mut self,
        id: TxParameterId,
        value: &T,
        sub_tx_id: SubTxId,
    ) -> Result<(), TxError> {
        self.params.try_set(id, value, sub_tx_id)?;
        self.services.db.save_tx_parameters(&self.tx_id, &self.params)?;
        Ok(())
    }
}
