//! Driver of a push transaction.
//!
//! [`PushTransaction::update`] is re-entrant: it looks at what the
//! parameter store already records, performs the next step that is
//! possible right now, and returns. The wallet calls it again whenever
//! something the transaction waits on may have changed (a key keeper
//! completion, a registration verdict, a new tip, a peer's voucher).

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::{Height, TxId};
use crate::keykeeper::{KeyKeeperError, Method};
use crate::params::TxParameterId;
use crate::shielded::ShieldedCoinStatus;
use crate::storage::CoinStatus;

use super::builder::Stage;
use super::context::TxContext;
use super::description::{TxDescription, TxStatus, TxType};
use super::error::{TxError, TxFailureReason};
use super::push_builder::{drop_incoming_shielded, PushTxBuilder};

pub struct PushTransaction {
    ctx: TxContext,
    builder: Option<PushTxBuilder>,
    registration_sent: bool,
}

impl PushTransaction {
    pub fn new(ctx: TxContext) -> Self {
        Self {
            ctx,
            builder: None,
            registration_sent: false,
        }
    }

    pub fn tx_id(&self) -> TxId {
        self.ctx.tx_id()
    }

    pub fn status(&self) -> TxStatus {
        self.ctx.get(TxParameterId::STATUS).unwrap_or_default()
    }

    pub fn generation(&self) -> u64 {
        self.ctx.generation()
    }

    pub fn set_generation(&mut self, generation: u64) {
        self.ctx.set_generation(generation);
    }

    pub fn context(&self) -> &TxContext {
        &self.ctx
    }

    pub fn description(&self) -> TxDescription {
        let mut desc = TxDescription::from_parameters(
            self.ctx.tx_id(),
            TxType::PushTransaction,
            self.ctx.params(),
        );
        if let Some(time) = self
            .ctx
            .get::<i64>(TxParameterId::MODIFY_TIME)
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        {
            desc.modify_time = time;
        }
        desc
    }

    /// Advance as far as currently possible. Errors fail the transaction.
    pub fn update(&mut self) {
        if let Err(err) = self.update_impl() {
            self.fail(err);
        }
    }

    fn update_impl(&mut self) -> Result<(), TxError> {
        let status = self.status();
        if status.is_terminal() {
            return Ok(());
        }
        if status == TxStatus::Pending {
            self.set_status(TxStatus::InProgress)?;
        }

        if self.builder.is_none() {
            self.builder = Some(PushTxBuilder::new(&mut self.ctx)?);
        }
        let Some(builder) = self.builder.as_mut() else {
            return Err(TxError::InvalidState("builder not loaded"));
        };

        // Expiry applies at every stage until the node has the transaction,
        // including while waiting for a voucher or a signature.
        let registered = self.ctx.get::<bool>(TxParameterId::TRANSACTION_REGISTERED);
        let max_height = builder.base.max_height;
        let tip: Height = self.ctx.gateway().tip_height();
        if registered.is_none() && tip > max_height {
            return Err(TxError::TransactionExpired { max_height, tip });
        }

        match builder.stage() {
            Stage::None => {
                let (value, asset_id) = (builder.value(), builder.asset_id());
                builder.base.select_inputs(&mut self.ctx, value, asset_id)?;
                builder.base.generate_inouts(&mut self.ctx)?;
                builder.sign_send_shielded(&mut self.ctx)?;
                // Either the signature is on its way or we wait for a voucher.
                return Ok(());
            }
            Stage::Signing => return Ok(()),
            Stage::Done => {}
        }

        match registered {
            None => {
                if !self.registration_sent {
                    let sub_tx_id = builder.base.sub_tx_id;
                    self.ctx
                        .gateway()
                        .register_tx(&self.ctx.tx_id(), sub_tx_id, &builder.base.transaction);
                    self.registration_sent = true;
                    info!(tx_id = %self.ctx.tx_id(), sub_tx_id, "transaction sent to the node");
                }
                if status != TxStatus::Registering {
                    self.set_status(TxStatus::Registering)?;
                }
                Ok(())
            }
            Some(true) => self.complete(tip),
            Some(false) => Err(TxError::FailedToRegister),
        }
    }

    /// Route an asynchronous key keeper result into the builder.
    pub fn on_key_keeper_event(&mut self, result: Result<Method, KeyKeeperError>) {
        if self.status().is_terminal() {
            debug!(tx_id = %self.ctx.tx_id(), "completion for a finished transaction, ignoring");
            return;
        }
        let Some(builder) = self.builder.as_mut() else {
            warn!(tx_id = %self.ctx.tx_id(), "completion before the builder was loaded, ignoring");
            return;
        };

        let outcome = match result {
            Ok(Method::SignSendShielded(m)) => builder.on_signed(&mut self.ctx, *m),
            Ok(other) => {
                warn!(tx_id = %self.ctx.tx_id(), method = other.name(), "unexpected completion, ignoring");
                return;
            }
            Err(err) => Err(builder.on_sign_failed(&self.ctx, err)),
        };
        match outcome {
            Ok(()) => self.update(),
            Err(err) => self.fail(err),
        }
    }

    /// The node's verdict on the registered transaction.
    pub fn on_registered(&mut self, accepted: bool) {
        if self.status().is_terminal() {
            return;
        }
        if let Err(err) = self.ctx.set(TxParameterId::TRANSACTION_REGISTERED, &accepted) {
            self.fail(err);
            return;
        }
        self.update();
    }

    pub fn cancel(&mut self) -> Result<(), TxError> {
        if !self.description().can_cancel() {
            return Err(TxError::InvalidState("transaction cannot be canceled"));
        }
        self.ctx.set(TxParameterId::FAILURE_REASON, &TxFailureReason::Canceled)?;
        self.set_status(TxStatus::Canceled)?;
        self.rollback()
    }

    fn fail(&mut self, err: TxError) {
        let reason = err.reason();
        warn!(tx_id = %self.ctx.tx_id(), ?reason, "transaction failed: {}", err);

        let result = self
            .ctx
            .set(TxParameterId::FAILURE_REASON, &reason)
            .and_then(|()| self.set_status(TxStatus::Failed))
            .and_then(|()| self.rollback());
        if let Err(e) = result {
            warn!(tx_id = %self.ctx.tx_id(), "could not record failure: {}", e);
        }
    }

    fn complete(&mut self, tip: Height) -> Result<(), TxError> {
        let tx_id = self.ctx.tx_id();
        self.ctx.set(TxParameterId::KERNEL_PROOF_HEIGHT, &tip)?;

        let db = self.ctx.db();
        for mut coin in db.get_coins()? {
            if coin.spent_tx_id == Some(tx_id) && coin.status == CoinStatus::Outgoing {
                coin.status = CoinStatus::Spent;
                db.save_coin(coin)?;
            } else if coin.create_tx_id == Some(tx_id) && coin.status == CoinStatus::Incoming {
                coin.status = CoinStatus::Available;
                db.save_coin(coin)?;
            }
        }
        for mut coin in db.get_shielded_coins()? {
            if coin.create_tx_id == Some(tx_id) && coin.status == ShieldedCoinStatus::Incoming {
                coin.status = ShieldedCoinStatus::Available;
                db.save_shielded_coin(coin)?;
            }
        }

        self.set_status(TxStatus::Completed)
    }

    /// Release coins reserved by this transaction.
    fn rollback(&mut self) -> Result<(), TxError> {
        let tx_id = self.ctx.tx_id();
        let db = self.ctx.db();
        let mut released = 0usize;
        for mut coin in db.get_coins()? {
            if coin.spent_tx_id == Some(tx_id) && coin.status == CoinStatus::Outgoing {
                coin.status = CoinStatus::Available;
                coin.spent_tx_id = None;
                db.save_coin(coin)?;
                released += 1;
            } else if coin.create_tx_id == Some(tx_id) && coin.status == CoinStatus::Incoming {
                coin.status = CoinStatus::Unavailable;
                db.save_coin(coin)?;
            }
        }
        let shielded = drop_incoming_shielded(&self.ctx)?;
        debug!(tx_id = %tx_id, released, shielded, "coins rolled back");
        Ok(())
    }

    fn set_status(&mut self, status: TxStatus) -> Result<(), TxError> {
        self.ctx.set(TxParameterId::STATUS, &status)?;
        self.ctx.set(TxParameterId::MODIFY_TIME, &Utc::now().timestamp())?;
        self.ctx.db().save_tx(&self.description())?;
        info!(tx_id = %self.ctx.tx_id(), ?status, "status changed");
        Ok(())
    }
}
