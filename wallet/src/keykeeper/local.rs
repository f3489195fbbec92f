//! Software key keeper backed by a master seed.

use std::collections::BTreeMap;
use std::sync::Arc;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use tracing::{debug, warn};

use crate::config::Rules;
use crate::core::{AssetId, CoinId};
use crate::crypto::keys::random_scalar;
use crate::crypto::{commit, Kdf, PeerId, SecretKey, Signature};
use crate::shielded::{ShieldedTicket, ShieldedVoucher, Viewer};
use crate::transaction::kernel::{Output, ShieldedTxo, TxKernel};

use super::method::{CreateVoucherShielded, Method, SignSendShielded};
use super::{KeyKeeperError, PrivateKeyKeeper};

const IDENTITY_CONTEXT: &str = "nova-wallet 2026 identity key";
const COIN_CONTEXT: &str = "nova-wallet 2026 coin blinding";
const VOUCHER_CONTEXT: &str = "nova-wallet 2026 voucher serial";
const VIEWER_CONTEXT: &str = "nova-wallet 2026 owner viewer";

/// Answers every method synchronously from a seed held in memory.
pub struct LocalKeyKeeper {
    kdf: Kdf,
    rules: Arc<Rules>,
}

impl LocalKeyKeeper {
    pub fn new(kdf: Kdf, rules: Arc<Rules>) -> Self {
        Self { kdf, rules }
    }

    /// Public wallet identity of the owned address with index `own_id`.
    pub fn identity(&self, own_id: u64) -> PeerId {
        self.identity_key(own_id).public_key()
    }

    /// Viewer that recognizes every voucher this keeper issues.
    pub fn owner_viewer(&self) -> Viewer {
        Viewer::new(self.kdf.derive_bytes(VIEWER_CONTEXT, &[]))
    }

    fn identity_key(&self, own_id: u64) -> SecretKey {
        self.kdf.derive_key(IDENTITY_CONTEXT, &own_id.to_be_bytes())
    }

    fn coin_blinding(&self, coin_id: &CoinId) -> Scalar {
        let mut index = Vec::with_capacity(20);
        index.extend_from_slice(&coin_id.idx.to_be_bytes());
        index.extend_from_slice(&coin_id.value.to_be_bytes());
        index.extend_from_slice(&coin_id.asset_id.to_be_bytes());
        self.kdf.derive_scalar(COIN_CONTEXT, &index)
    }

    fn create_vouchers(&self, m: &mut CreateVoucherShielded) -> Result<(), KeyKeeperError> {
        if m.my_id_key == 0 {
            return Err(KeyKeeperError::UnknownIdentity);
        }
        let identity = self.identity_key(m.my_id_key);
        let viewer = self.owner_viewer();

        m.result.clear();
        for i in 0..m.count.max(1) {
            let mut index = Vec::with_capacity(44);
            index.extend_from_slice(&m.my_id_key.to_be_bytes());
            index.extend_from_slice(&m.nonce);
            index.extend_from_slice(&i.to_be_bytes());
            let serial = self.kdf.derive_scalar(VOUCHER_CONTEXT, &index);
            let serial_pub = PeerId::from_point(&RistrettoPoint::mul_base(&serial));

            let mut voucher = ShieldedVoucher {
                ticket: ShieldedTicket {
                    serial_pub,
                    recovery_tag: viewer.recovery_tag(&serial_pub),
                },
                shared_secret: viewer.shared_secret(&serial_pub),
                signature: Signature::default(),
            };
            voucher.signature = Signature::sign(&voucher.hash(), identity.scalar());
            m.result.push(voucher);
        }
        Ok(())
    }

    fn sign_send_shielded(&self, m: &mut SignSendShielded) -> Result<(), KeyKeeperError> {
        if !m.voucher.is_valid(&m.peer) {
            warn!("voucher signature does not match the peer identity");
            return Err(KeyKeeperError::InvalidVoucher);
        }
        if let Some(my_id) = m.my_id_key {
            if self.identity(my_id) != m.peer {
                return Err(KeyKeeperError::UnknownIdentity);
            }
        }

        // Per-asset value flow: inputs − outputs − sent − fee must be zero.
        let mut delta: BTreeMap<AssetId, i128> = BTreeMap::new();
        for c in &m.common.inputs {
            *delta.entry(c.asset_id).or_default() += i128::from(c.value);
        }
        for c in &m.common.outputs {
            *delta.entry(c.asset_id).or_default() -= i128::from(c.value);
        }
        *delta.entry(m.asset_id).or_default() -= i128::from(m.value);
        *delta.entry(0).or_default() -= i128::from(m.common.fee);
        if delta.values().any(|d| *d != 0) {
            return Err(KeyKeeperError::Unbalanced);
        }

        let shielded_blind = m.voucher.output_blinding();
        let mut blind_sum = shielded_blind;
        for c in &m.common.outputs {
            blind_sum += self.coin_blinding(c);
        }
        for c in &m.common.inputs {
            blind_sum -= self.coin_blinding(c);
        }

        let offset = random_scalar();
        let excess = blind_sum - offset;

        let mut kernel = TxKernel::new(m.common.fee, m.common.min_height, m.common.max_height);
        kernel.shielded_output = Some(ShieldedTxo {
            ticket: m.voucher.ticket,
            commitment: commit(m.value, m.asset_id, &shielded_blind).compress(),
            asset_id: m.asset_id,
        });
        kernel.sign(&excess, &self.rules);

        m.kernel = Some(kernel);
        m.offset = offset;
        Ok(())
    }
}

impl PrivateKeyKeeper for LocalKeyKeeper {
    fn invoke_sync(&self, method: &mut Method) -> Result<(), KeyKeeperError> {
        debug!(method = method.name(), "local key keeper invoked");
        match method {
            Method::GetCommitment(m) => {
                let blind = self.coin_blinding(&m.coin_id);
                m.result = Some(commit(m.coin_id.value, m.coin_id.asset_id, &blind).compress());
                Ok(())
            }
            Method::CreateOutput(m) => {
                let blind = self.coin_blinding(&m.coin_id);
                m.result = Some(Output {
                    commitment: commit(m.coin_id.value, m.coin_id.asset_id, &blind).compress(),
                    asset_id: m.coin_id.asset_id,
                });
                Ok(())
            }
            Method::CreateVoucherShielded(m) => self.create_vouchers(m),
            Method::SignSendShielded(m) => self.sign_send_shielded(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keykeeper::method::{CreateOutput, GetCommitment, TxCommon};
    use crate::transaction::kernel::{Input, Transaction};

    fn keeper() -> LocalKeyKeeper {
        LocalKeyKeeper::new(Kdf::from_seed([42u8; 32]), Arc::new(Rules::default()))
    }

    fn voucher_for(kk: &LocalKeyKeeper, own_id: u64) -> ShieldedVoucher {
        let mut m = Method::CreateVoucherShielded(CreateVoucherShielded {
            my_id_key: own_id,
            nonce: [5u8; 32],
            count: 1,
            result: Vec::new(),
        });
        kk.invoke_sync(&mut m).unwrap();
        match m {
            Method::CreateVoucherShielded(m) => m.result[0].clone(),
            _ => unreachable!(),
        }
    }

    fn commitment(kk: &LocalKeyKeeper, coin_id: CoinId) -> curve25519_dalek::ristretto::CompressedRistretto {
        let mut m = Method::GetCommitment(GetCommitment { coin_id, result: None });
        kk.invoke_sync(&mut m).unwrap();
        match m {
            Method::GetCommitment(m) => m.result.unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn output_matches_commitment() {
        let kk = keeper();
        let coin = CoinId::new(3, 500, 0);
        let mut m = Method::CreateOutput(CreateOutput { coin_id: coin, result: None });
        kk.invoke_sync(&mut m).unwrap();
        let Method::CreateOutput(m) = m else { unreachable!() };
        assert_eq!(m.result.unwrap().commitment, commitment(&kk, coin));
    }

    #[test]
    fn vouchers_are_signed_and_recoverable() {
        let kk = keeper();
        let voucher = voucher_for(&kk, 1);
        assert!(voucher.is_valid(&kk.identity(1)));
        assert!(!voucher.is_valid(&kk.identity(2)));
        assert!(kk.owner_viewer().recover(&voucher.ticket).is_some());
    }

    #[test]
    fn voucher_for_unowned_address_is_refused() {
        let kk = keeper();
        let mut m = Method::CreateVoucherShielded(CreateVoucherShielded {
            my_id_key: 0,
            nonce: [0u8; 32],
            count: 1,
            result: Vec::new(),
        });
        assert_eq!(kk.invoke_sync(&mut m), Err(KeyKeeperError::UnknownIdentity));
    }

    fn sign_request(kk: &LocalKeyKeeper, value: u64, fee: u64) -> SignSendShielded {
        let common = TxCommon {
            inputs: vec![CoinId::new(1, 1_000, 0)],
            outputs: vec![CoinId::new(2, 1_000 - value - fee, 0)],
            fee,
            min_height: 10,
            max_height: 130,
        };
        SignSendShielded::new(common, value, 0, kk.identity(1), voucher_for(kk, 1))
    }

    #[test]
    fn signed_kernel_balances_the_transaction() {
        let kk = keeper();
        let req = sign_request(&kk, 600, 20);
        let common = req.common.clone();
        let mut m = Method::SignSendShielded(Box::new(req));
        kk.invoke_sync(&mut m).unwrap();
        let Method::SignSendShielded(m) = m else { unreachable!() };

        let tx = Transaction {
            inputs: common
                .inputs
                .iter()
                .map(|c| Input { commitment: commitment(&kk, *c) })
                .collect(),
            outputs: common
                .outputs
                .iter()
                .map(|c| Output {
                    commitment: commitment(&kk, *c),
                    asset_id: c.asset_id,
                })
                .collect(),
            kernels: vec![m.kernel.clone().unwrap()],
            offset: m.offset,
        };
        assert_eq!(tx.validate(&Rules::default()), Ok(()));
    }

    #[test]
    fn unbalanced_request_is_refused() {
        let kk = keeper();
        let mut req = sign_request(&kk, 600, 20);
        req.value += 1;
        let mut m = Method::SignSendShielded(Box::new(req));
        assert_eq!(kk.invoke_sync(&mut m), Err(KeyKeeperError::Unbalanced));
    }

    #[test]
    fn voucher_from_someone_else_is_refused() {
        let kk = keeper();
        let mut req = sign_request(&kk, 600, 20);
        req.peer = kk.identity(2);
        let mut m = Method::SignSendShielded(Box::new(req));
        assert_eq!(kk.invoke_sync(&mut m), Err(KeyKeeperError::InvalidVoucher));
    }

    #[test]
    fn foreign_identity_key_is_refused() {
        let kk = keeper();
        let mut req = sign_request(&kk, 600, 20);
        req.my_id_key = Some(2);
        let mut m = Method::SignSendShielded(Box::new(req));
        assert_eq!(kk.invoke_sync(&mut m), Err(KeyKeeperError::UnknownIdentity));
    }
}
