//! The transaction parameter store.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::config::DEFAULT_SUB_TX_ID;
use crate::core::{SubTxId, TxId};

use super::codec;
use super::error::{ParameterError, TokenError};
use super::id::TxParameterId;

/// Flat wire form of [`TxParameters`].
///
/// Entries belong to the default sub-transaction until a
/// [`TxParameterId::SUB_TX_INDEX`] entry switches the namespace.
pub type PackedTxParameters = Vec<(TxParameterId, Vec<u8>)>;

/// Everything known about one transaction, as opaque encoded values keyed
/// by sub-transaction and parameter id.
///
/// Values are stored in their encoded form and decoded on access, so the
/// store can carry parameters this build has no type for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxParameters {
    id: Option<TxId>,
    parameters: BTreeMap<SubTxId, BTreeMap<TxParameterId, Vec<u8>>>,
}

impl TxParameters {
    pub fn new(id: Option<TxId>) -> Self {
        Self {
            id,
            parameters: BTreeMap::new(),
        }
    }

    pub fn tx_id(&self) -> Option<TxId> {
        self.id
    }

    pub fn set_tx_id(&mut self, id: TxId) -> &mut Self {
        self.id = Some(id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    // -- raw access ---------------------------------------------------------

    pub fn get_raw(&self, id: TxParameterId, sub_tx_id: SubTxId) -> Option<&[u8]> {
        self.parameters
            .get(&sub_tx_id)
            .and_then(|ns| ns.get(&id))
            .map(Vec::as_slice)
    }

    pub fn set_raw(&mut self, id: TxParameterId, value: Vec<u8>, sub_tx_id: SubTxId) -> &mut Self {
        self.parameters.entry(sub_tx_id).or_default().insert(id, value);
        self
    }

    pub fn contains(&self, id: TxParameterId, sub_tx_id: SubTxId) -> bool {
        self.get_raw(id, sub_tx_id).is_some()
    }

    /// Remove a value. Returns whether it was present.
    pub fn delete(&mut self, id: TxParameterId, sub_tx_id: SubTxId) -> bool {
        let Some(ns) = self.parameters.get_mut(&sub_tx_id) else {
            return false;
        };
        let removed = ns.remove(&id).is_some();
        if ns.is_empty() {
            self.parameters.remove(&sub_tx_id);
        }
        removed
    }

    /// Sub-transactions that hold at least one parameter, ascending.
    pub fn sub_tx_ids(&self) -> impl Iterator<Item = SubTxId> + '_ {
        self.parameters.keys().copied()
    }

    // -- typed access -------------------------------------------------------

    /// Typed lookup in the default sub-transaction.
    pub fn get<T: DeserializeOwned>(&self, id: TxParameterId) -> Option<T> {
        self.get_sub(id, DEFAULT_SUB_TX_ID)
    }

    /// Typed lookup. A value that fails to decode is reported and treated as
    /// absent.
    pub fn get_sub<T: DeserializeOwned>(&self, id: TxParameterId, sub_tx_id: SubTxId) -> Option<T> {
        let raw = self.get_raw(id, sub_tx_id)?;
        match codec::decode(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(tx_id = ?self.id, param = %id, sub_tx_id, "parameter does not decode: {}", e);
                None
            }
        }
    }

    pub fn get_mandatory<T: DeserializeOwned>(&self, id: TxParameterId) -> Result<T, ParameterError> {
        self.get_mandatory_sub(id, DEFAULT_SUB_TX_ID)
    }

    /// Typed lookup that fails instead of returning `None`.
    pub fn get_mandatory_sub<T: DeserializeOwned>(
        &self,
        id: TxParameterId,
        sub_tx_id: SubTxId,
    ) -> Result<T, ParameterError> {
        let raw = self
            .get_raw(id, sub_tx_id)
            .ok_or(ParameterError::Missing { id, sub_tx_id })?;
        codec::decode(raw).map_err(|_| ParameterError::Malformed { id, sub_tx_id })
    }

    pub fn try_set<T: Serialize + ?Sized>(
        &mut self,
        id: TxParameterId,
        value: &T,
        sub_tx_id: SubTxId,
    ) -> Result<&mut Self, ParameterError> {
        let raw = codec::encode(value)?;
        Ok(self.set_raw(id, raw, sub_tx_id))
    }

    /// Typed store in the default sub-transaction. Overwrites.
    pub fn set<T: Serialize + ?Sized>(&mut self, id: TxParameterId, value: &T) -> &mut Self {
        self.set_sub(id, value, DEFAULT_SUB_TX_ID)
    }

    /// Typed store. A value that cannot be encoded (only possible past the
    /// size limit) is logged and leaves the store unchanged.
    pub fn set_sub<T: Serialize + ?Sized>(
        &mut self,
        id: TxParameterId,
        value: &T,
        sub_tx_id: SubTxId,
    ) -> &mut Self {
        match codec::encode(value) {
            Ok(raw) => self.set_raw(id, raw, sub_tx_id),
            Err(e) => {
                error!(tx_id = ?self.id, param = %id, sub_tx_id, "parameter does not encode: {}", e);
                self
            }
        }
    }

    // -- packing ------------------------------------------------------------

    /// Flatten into wire order: the default sub-transaction first, then the
    /// others ascending, each introduced by a sub-tx index entry.
    pub fn pack(&self) -> Result<PackedTxParameters, TokenError> {
        let mut packed = PackedTxParameters::new();

        if let Some(ns) = self.parameters.get(&DEFAULT_SUB_TX_ID) {
            packed.extend(ns.iter().map(|(id, v)| (*id, v.clone())));
        }
        for (sub_tx_id, ns) in &self.parameters {
            if *sub_tx_id == DEFAULT_SUB_TX_ID {
                continue;
            }
            packed.push((TxParameterId::SUB_TX_INDEX, codec::encode(sub_tx_id)?));
            packed.extend(ns.iter().map(|(id, v)| (*id, v.clone())));
        }
        Ok(packed)
    }

    /// Rebuild from wire order. Sub-tx index entries switch the current
    /// namespace and are not stored themselves.
    pub fn unpack(id: Option<TxId>, packed: &[(TxParameterId, Vec<u8>)]) -> Result<Self, TokenError> {
        let mut params = Self::new(id);
        let mut current = DEFAULT_SUB_TX_ID;
        for (param_id, value) in packed {
            if *param_id == TxParameterId::SUB_TX_INDEX {
                current = codec::decode(value).map_err(|_| TokenError::InvalidSubTxIndex)?;
                continue;
            }
            params.set_raw(*param_id, value.clone(), current);
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WalletId;
    use crate::crypto::SecretKey;

    #[test]
    fn set_overwrites_and_chains() {
        let mut p = TxParameters::default();
        p.set(TxParameterId::AMOUNT, &5u64).set(TxParameterId::FEE, &1u64);
        p.set(TxParameterId::AMOUNT, &7u64);
        assert_eq!(p.get::<u64>(TxParameterId::AMOUNT), Some(7));
        assert_eq!(p.get::<u64>(TxParameterId::FEE), Some(1));
    }

    #[test]
    fn namespaces_are_independent() {
        let mut p = TxParameters::default();
        p.set_sub(TxParameterId::AMOUNT, &1u64, 1);
        p.set_sub(TxParameterId::AMOUNT, &2u64, 2);
        assert_eq!(p.get_sub::<u64>(TxParameterId::AMOUNT, 1), Some(1));
        assert_eq!(p.get_sub::<u64>(TxParameterId::AMOUNT, 2), Some(2));
        assert_eq!(p.get_sub::<u64>(TxParameterId::AMOUNT, 3), None);
    }

    #[test]
    fn mandatory_lookup_reports_missing_and_malformed() {
        let mut p = TxParameters::default();
        assert!(matches!(
            p.get_mandatory::<u64>(TxParameterId::AMOUNT),
            Err(ParameterError::Missing { id: TxParameterId::AMOUNT, sub_tx_id: 1 })
        ));

        p.set_raw(TxParameterId::AMOUNT, vec![0xFF, 0xFF], DEFAULT_SUB_TX_ID);
        assert!(matches!(
            p.get_mandatory::<u64>(TxParameterId::AMOUNT),
            Err(ParameterError::Malformed { .. })
        ));
        assert_eq!(p.get::<u64>(TxParameterId::AMOUNT), None);
    }

    #[test]
    fn delete_drops_empty_namespace() {
        let mut a = TxParameters::default();
        let b = a.clone();
        a.set_sub(TxParameterId::FEE, &3u64, 4);
        assert!(a.delete(TxParameterId::FEE, 4));
        assert!(!a.delete(TxParameterId::FEE, 4));
        assert_eq!(a, b);
    }

    #[test]
    fn pack_unpack_roundtrip_across_namespaces() {
        let mut p = TxParameters::new(Some(TxId::generate()));
        p.set(TxParameterId::AMOUNT, &100_000_000u64);
        p.set(TxParameterId::PEER_ID, &WalletId::new(0, SecretKey::random().public_key()));
        p.set_sub(TxParameterId::AMOUNT, &3u64, 2);
        p.set_sub(TxParameterId::MESSAGE, &b"leg".to_vec(), 7);
        p.set_raw(TxParameterId(99), vec![1, 2, 3], 7);

        let packed = p.pack().unwrap();
        let back = TxParameters::unpack(p.tx_id(), &packed).unwrap();
        assert_eq!(back, p);
        assert_eq!(back.pack().unwrap(), packed);
    }

    #[test]
    fn default_namespace_comes_first() {
        let mut p = TxParameters::default();
        p.set_sub(TxParameterId::AMOUNT, &1u64, 0);
        p.set(TxParameterId::FEE, &2u64);

        let packed = p.pack().unwrap();
        assert_eq!(packed[0].0, TxParameterId::FEE);
        assert_eq!(packed[1].0, TxParameterId::SUB_TX_INDEX);
        assert_eq!(packed[2].0, TxParameterId::AMOUNT);

        let back = TxParameters::unpack(None, &packed).unwrap();
        assert_eq!(back.get_sub::<u64>(TxParameterId::AMOUNT, 0), Some(1));
        assert_eq!(back.get::<u64>(TxParameterId::FEE), Some(2));
    }

    #[test]
    fn sub_tx_index_is_never_stored() {
        let mut p = TxParameters::default();
        p.set_sub(TxParameterId::AMOUNT, &1u64, 5);
        let back = TxParameters::unpack(None, &p.pack().unwrap()).unwrap();
        assert!(!back.contains(TxParameterId::SUB_TX_INDEX, DEFAULT_SUB_TX_ID));
        assert!(!back.contains(TxParameterId::SUB_TX_INDEX, 5));
    }

    #[test]
    fn malformed_sub_tx_index_fails_unpack() {
        let packed = vec![(TxParameterId::SUB_TX_INDEX, vec![])];
        assert!(matches!(
            TxParameters::unpack(None, &packed),
            Err(TokenError::InvalidSubTxIndex)
        ));
    }
}
