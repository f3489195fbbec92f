//! Builder for a shielded ("push") send.

use tracing::{debug, info, warn};

use crate::config::DEFAULT_SUB_TX_ID;
use crate::core::{Amount, AssetId, WalletId};
use crate::crypto::{HashValue, PeerId};
use crate::keykeeper::{
    CreateVoucherShielded, KeyKeeperError, Method, ShieldedUserData, SignSendShielded,
};
use crate::params::TxParameterId;
use crate::shielded::{ShieldedCoin, ShieldedCoinStatus, ShieldedVoucherList};

use super::builder::{BaseTxBuilder, Stage};
use super::context::TxContext;
use super::error::TxError;

pub struct PushTxBuilder {
    pub base: BaseTxBuilder,
    value: Amount,
    asset_id: AssetId,
}

impl PushTxBuilder {
    /// Load the builder from the parameter store. A transaction whose kernel
    /// id is already recorded comes back as signed.
    pub fn new(ctx: &mut TxContext) -> Result<Self, TxError> {
        let value: Amount = ctx.get_mandatory(TxParameterId::AMOUNT)?;
        let asset_id: AssetId = ctx.get(TxParameterId::ASSET_ID).unwrap_or(0);

        let mut base = BaseTxBuilder::new(ctx, DEFAULT_SUB_TX_ID)?;
        if ctx.contains(TxParameterId::KERNEL_ID, base.sub_tx_id) {
            base.signing = Stage::Done;
        }
        Ok(Self {
            base,
            value,
            asset_id,
        })
    }

    pub fn value(&self) -> Amount {
        self.value
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn stage(&self) -> Stage {
        self.base.signing
    }

    /// Ask the key keeper for the kernel of the shielded output.
    ///
    /// Returns without doing anything if signing already started or
    /// finished, and without error if the peer's voucher has not arrived
    /// yet; call again later in both cases.
    pub fn sign_send_shielded(&mut self, ctx: &mut TxContext) -> Result<(), TxError> {
        if self.base.signing != Stage::None {
            return Ok(());
        }

        let my_id: WalletId = ctx.get_mandatory(TxParameterId::MY_ID)?;
        let peer_id: Option<WalletId> = ctx.get(TxParameterId::PEER_ID);

        let mut my_id_key: Option<u64> = None;
        let peer = match ctx.get::<PeerId>(TxParameterId::PEER_WALLET_IDENTITY) {
            Some(identity) => identity,
            None => {
                let address = ctx
                    .db()
                    .get_address(&peer_id.unwrap_or(my_id))?
                    .ok_or(TxError::NoVouchers)?;
                if address.is_own() {
                    my_id_key = Some(address.own_id);
                }
                address.identity
            }
        };

        // Once the pending list is stored it is the only source of vouchers:
        // an emptied list never falls back to the token's list.
        let stored: Option<ShieldedVoucherList> = ctx.get(TxParameterId::UNUSED_SHIELDED_VOUCHER_LIST);
        let mut vouchers = match stored {
            Some(list) if !list.is_empty() => list,
            stored => {
                let from_token = if stored.is_none() {
                    non_empty(ctx.get(TxParameterId::SHIELDED_VOUCHER_LIST))
                } else {
                    None
                };
                let list = match from_token {
                    Some(list) => list,
                    None => match my_id_key {
                        Some(own_id) => self.create_own_voucher(ctx, own_id)?,
                        None => {
                            let peer_id = peer_id.ok_or(TxError::NoVouchers)?;
                            match ctx.gateway().get_unique_voucher(&peer_id, &ctx.tx_id()) {
                                Some(voucher) => vec![voucher],
                                None => {
                                    debug!(tx_id = %ctx.tx_id(), peer = %peer_id, "waiting for a voucher");
                                    return Ok(());
                                }
                            }
                        }
                    },
                };
                ctx.set(TxParameterId::UNUSED_SHIELDED_VOUCHER_LIST, &list)?;
                list
            }
        };

        let voucher = vouchers.pop().ok_or(TxError::NoVouchers)?;
        ctx.set(TxParameterId::UNUSED_SHIELDED_VOUCHER_LIST, &vouchers)?;

        let mut user = ShieldedUserData::default();
        if my_id_key.is_none() {
            if let Some(address) = ctx.db().get_address(&my_id)? {
                user.sender = address.identity;
            }
        }

        // Our own voucher: record the coin now instead of waiting for a scan.
        // A restart may have left the coin of an earlier signing attempt.
        if ctx.db().owner_viewer().recover(&voucher.ticket).is_some() {
            drop_incoming_shielded(ctx)?;
            ctx.db().save_shielded_coin(ShieldedCoin {
                serial_pub: voucher.ticket.serial_pub,
                value: self.value,
                asset_id: self.asset_id,
                sender: user.sender,
                create_tx_id: Some(ctx.tx_id()),
                status: ShieldedCoinStatus::Incoming,
            })?;
            ctx.set(TxParameterId::IS_SELF_TX, &true)?;
        }

        let mut m = SignSendShielded::new(self.base.common(), self.value, self.asset_id, peer, voucher);
        m.user = user;
        m.my_id_key = my_id_key;

        self.base.signing = Stage::Signing;
        info!(
            tx_id = %ctx.tx_id(),
            sub_tx_id = self.base.sub_tx_id,
            value = self.value,
            asset_id = self.asset_id,
            "requesting shielded kernel signature"
        );
        let handler = ctx.handler(self.base.sub_tx_id);
        ctx.key_keeper()
            .invoke_async(Method::SignSendShielded(Box::new(m)), handler);
        Ok(())
    }

    fn create_own_voucher(&self, ctx: &TxContext, own_id: u64) -> Result<ShieldedVoucherList, TxError> {
        let mut nonce: HashValue = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut nonce);
        let mut m = Method::CreateVoucherShielded(CreateVoucherShielded {
            my_id_key: own_id,
            nonce,
            count: 1,
            result: Vec::new(),
        });
        ctx.key_keeper().invoke_sync(&mut m)?;
        match m {
            Method::CreateVoucherShielded(m) if !m.result.is_empty() => Ok(m.result),
            _ => Err(KeyKeeperError::Unspecified.into()),
        }
    }

    /// Fold a successful signature into the transaction.
    pub fn on_signed(&mut self, ctx: &mut TxContext, m: SignSendShielded) -> Result<(), TxError> {
        if self.base.signing != Stage::Signing {
            warn!(tx_id = %ctx.tx_id(), stage = ?self.base.signing, "unexpected signature, ignoring");
            return Ok(());
        }
        self.base.signing = Stage::Done;

        let kernel = m.kernel.ok_or(KeyKeeperError::Unspecified)?;
        let sub_tx_id = self.base.sub_tx_id;

        self.base.transaction.offset += m.offset;
        ctx.set_sub(TxParameterId::KERNEL, &kernel, sub_tx_id)?;
        ctx.set_sub(TxParameterId::KERNEL_ID, &kernel.id, sub_tx_id)?;
        ctx.set_sub(TxParameterId::OFFSET, &self.base.transaction.offset, sub_tx_id)?;
        ctx.set(TxParameterId::SHIELDED_SERIAL_PUB, &m.voucher.ticket.serial_pub)?;
        self.base.transaction.kernels.push(kernel);

        if !self.base.verify_tx(ctx.rules()) {
            return Err(TxError::ConsistencyCheckFailed);
        }
        info!(tx_id = %ctx.tx_id(), sub_tx_id, "shielded kernel signed");
        Ok(())
    }

    /// The key keeper refused. Signing does not restart on its own.
    pub fn on_sign_failed(&mut self, ctx: &TxContext, err: KeyKeeperError) -> TxError {
        warn!(tx_id = %ctx.tx_id(), sub_tx_id = self.base.sub_tx_id, "key keeper failed: {}", err);
        TxError::KeyKeeper(err)
    }
}

fn non_empty(list: Option<ShieldedVoucherList>) -> Option<ShieldedVoucherList> {
    list.filter(|l| !l.is_empty())
}

/// Forget shielded coins this transaction recorded but never delivered.
pub(super) fn drop_incoming_shielded(ctx: &TxContext) -> Result<usize, TxError> {
    let tx_id = ctx.tx_id();
    let mut dropped = 0;
    for coin in ctx.db().get_shielded_coins()? {
        if coin.create_tx_id == Some(tx_id) && coin.status == ShieldedCoinStatus::Incoming {
            ctx.db().delete_shielded_coin(&coin.serial_pub)?;
            dropped += 1;
        }
    }
    Ok(dropped)
}
