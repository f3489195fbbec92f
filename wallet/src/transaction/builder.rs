//! Shared transaction-building steps.
//!
//! [`BaseTxBuilder`] owns the in-progress [`Transaction`] of one
//! sub-transaction and the steps every kind of send goes through: pick
//! inputs, add change, and turn coin ids into commitments with the key
//! keeper. Each step records its result in the parameter store and is
//! skipped when the result is already there, so the builder can be
//! rebuilt and re-driven from persisted state at any point.

use std::collections::BTreeMap;

use curve25519_dalek::scalar::Scalar;
use tracing::{debug, info};

use crate::config::Rules;
use crate::core::{Amount, AssetId, CoinId, Height, SubTxId};
use crate::keykeeper::{CreateOutput, GetCommitment, Method, TxCommon};
use crate::params::TxParameterId;
use crate::storage::{Coin, CoinStatus};

use super::context::TxContext;
use super::error::TxError;
use super::kernel::{Input, Output, Transaction, TxKernel};

/// Signing progress of one sub-transaction.
///
/// At most one key keeper call is outstanding per sub-transaction: the
/// call is only made from `None`, and `Signing` lasts until it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    None,
    Signing,
    Done,
}

pub struct BaseTxBuilder {
    pub sub_tx_id: SubTxId,
    pub transaction: Transaction,
    pub fee: Amount,
    pub min_height: Height,
    pub max_height: Height,
    pub input_coins: Vec<CoinId>,
    pub output_coins: Vec<CoinId>,
    pub signing: Stage,
}

impl BaseTxBuilder {
    /// Load everything already decided for `sub_tx_id`, filling in fee and
    /// validity window defaults on first run.
    pub fn new(ctx: &mut TxContext, sub_tx_id: SubTxId) -> Result<Self, TxError> {
        let fee = match ctx.get_sub::<Amount>(TxParameterId::FEE, sub_tx_id) {
            Some(fee) => fee,
            None => {
                let fee = ctx.rules().default_push_fee();
                ctx.set_sub(TxParameterId::FEE, &fee, sub_tx_id)?;
                fee
            }
        };

        let min_height = match ctx.get_sub::<Height>(TxParameterId::MIN_HEIGHT, sub_tx_id) {
            Some(h) => h,
            None => {
                let h = ctx.gateway().tip_height();
                ctx.set_sub(TxParameterId::MIN_HEIGHT, &h, sub_tx_id)?;
                h
            }
        };

        let max_height = match ctx.get_sub::<Height>(TxParameterId::MAX_HEIGHT, sub_tx_id) {
            Some(h) => h,
            None => {
                let lifetime = ctx
                    .get::<Height>(TxParameterId::LIFETIME)
                    .unwrap_or(ctx.rules().default_lifetime);
                let h = min_height.saturating_add(lifetime);
                ctx.set_sub(TxParameterId::MAX_HEIGHT, &h, sub_tx_id)?;
                h
            }
        };

        let mut transaction = Transaction {
            inputs: ctx.get_sub(TxParameterId::INPUTS, sub_tx_id).unwrap_or_default(),
            outputs: ctx.get_sub(TxParameterId::OUTPUTS, sub_tx_id).unwrap_or_default(),
            kernels: Vec::new(),
            offset: ctx
                .get_sub::<Scalar>(TxParameterId::OFFSET, sub_tx_id)
                .unwrap_or(Scalar::ZERO),
        };
        if let Some(kernel) = ctx.get_sub::<TxKernel>(TxParameterId::KERNEL, sub_tx_id) {
            transaction.kernels.push(kernel);
        }

        Ok(Self {
            sub_tx_id,
            transaction,
            fee,
            min_height,
            max_height,
            input_coins: ctx.get_sub(TxParameterId::INPUT_COINS, sub_tx_id).unwrap_or_default(),
            output_coins: ctx.get_sub(TxParameterId::OUTPUT_COINS, sub_tx_id).unwrap_or_default(),
            signing: Stage::None,
        })
    }

    /// Reserve coins covering `value` of `asset_id` plus the fee, and
    /// allocate change coins for the excess.
    pub fn select_inputs(&mut self, ctx: &mut TxContext, value: Amount, asset_id: AssetId) -> Result<(), TxError> {
        if ctx.contains(TxParameterId::INPUT_COINS, self.sub_tx_id) {
            return Ok(());
        }

        // The amount may come from a peer's token: no sum may wrap.
        let mut required: BTreeMap<AssetId, Amount> = BTreeMap::new();
        required.insert(asset_id, value);
        let native = required.entry(0).or_default();
        *native = native.checked_add(self.fee).ok_or(TxError::NotEnoughFunds {
            required: Amount::MAX,
            asset_id: 0,
        })?;

        let mut selected: Vec<Coin> = Vec::new();
        let mut change: Vec<CoinId> = Vec::new();
        for (asset, amount) in required {
            if amount == 0 {
                continue;
            }
            let coins = ctx.db().select_coins(amount, asset)?;
            if coins.is_empty() {
                return Err(TxError::NotEnoughFunds {
                    required: amount,
                    asset_id: asset,
                });
            }
            let total = coins
                .iter()
                .try_fold(0 as Amount, |acc, c| acc.checked_add(c.id.value))
                .ok_or(TxError::InvalidState("selected coins overflow"))?;
            if total > amount {
                let idx = ctx.db().allocate_coin_id()?;
                change.push(CoinId::new(idx, total - amount, asset));
            }
            selected.extend(coins);
        }

        let tx_id = ctx.tx_id();
        for mut coin in selected {
            self.input_coins.push(coin.id);
            coin.status = CoinStatus::Outgoing;
            coin.spent_tx_id = Some(tx_id);
            ctx.db().save_coin(coin)?;
        }
        for id in &change {
            let mut coin = Coin::new(*id, CoinStatus::Incoming);
            coin.create_tx_id = Some(tx_id);
            ctx.db().save_coin(coin)?;
        }
        self.output_coins.extend(change);

        let native_change: Amount = self
            .output_coins
            .iter()
            .filter(|c| c.asset_id == 0)
            .map(|c| c.value)
            .sum();

        ctx.set_sub(TxParameterId::INPUT_COINS, &self.input_coins, self.sub_tx_id)?;
        ctx.set_sub(TxParameterId::OUTPUT_COINS, &self.output_coins, self.sub_tx_id)?;
        ctx.set_sub(TxParameterId::CHANGE, &native_change, self.sub_tx_id)?;
        info!(
            tx_id = %tx_id,
            inputs = self.input_coins.len(),
            change = native_change,
            "inputs selected"
        );
        Ok(())
    }

    /// Turn the selected coins into transaction inputs and outputs.
    pub fn generate_inouts(&mut self, ctx: &mut TxContext) -> Result<(), TxError> {
        if !ctx.contains(TxParameterId::INPUTS, self.sub_tx_id) {
            let mut inputs = Vec::with_capacity(self.input_coins.len());
            for coin_id in &self.input_coins {
                let mut m = Method::GetCommitment(GetCommitment {
                    coin_id: *coin_id,
                    result: None,
                });
                ctx.key_keeper().invoke_sync(&mut m)?;
                match m {
                    Method::GetCommitment(GetCommitment {
                        result: Some(commitment),
                        ..
                    }) => inputs.push(Input { commitment }),
                    _ => return Err(TxError::ConsistencyCheckFailed),
                }
            }
            ctx.set_sub(TxParameterId::INPUTS, &inputs, self.sub_tx_id)?;
            self.transaction.inputs = inputs;
        }

        if !ctx.contains(TxParameterId::OUTPUTS, self.sub_tx_id) {
            let mut outputs: Vec<Output> = Vec::with_capacity(self.output_coins.len());
            for coin_id in &self.output_coins {
                let mut m = Method::CreateOutput(CreateOutput {
                    coin_id: *coin_id,
                    result: None,
                });
                ctx.key_keeper().invoke_sync(&mut m)?;
                match m {
                    Method::CreateOutput(CreateOutput {
                        result: Some(output),
                        ..
                    }) => outputs.push(output),
                    _ => return Err(TxError::ConsistencyCheckFailed),
                }
            }
            ctx.set_sub(TxParameterId::OUTPUTS, &outputs, self.sub_tx_id)?;
            self.transaction.outputs = outputs;
        }

        debug!(
            tx_id = %ctx.tx_id(),
            inputs = self.transaction.inputs.len(),
            outputs = self.transaction.outputs.len(),
            "inputs and outputs generated"
        );
        Ok(())
    }

    /// Shape of the transaction as the key keeper needs to see it.
    pub fn common(&self) -> TxCommon {
        TxCommon {
            inputs: self.input_coins.clone(),
            outputs: self.output_coins.clone(),
            fee: self.fee,
            min_height: self.min_height,
            max_height: self.max_height,
        }
    }

    pub fn verify_tx(&self, rules: &Rules) -> bool {
        match self.transaction.validate(rules) {
            Ok(()) => true,
            Err(e) => {
                debug!(sub_tx_id = self.sub_tx_id, "transaction does not verify: {}", e);
                false
            }
        }
    }
}
