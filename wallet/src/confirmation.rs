//! # Signed Confirmations
//!
//! A confirmation is a statement one wallet signs so another can prove it
//! later: the receiver of a payment confirms kernel, sender and value, an
//! offer publisher confirms the offer bytes, and so on.
//!
//! Every variant hashes its fields behind its own ASCII label. A signature
//! produced for one variant therefore never verifies as another, and a
//! payment confirmation for one asset never verifies for a different one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Amount, AssetId};
use crate::crypto::{HashProcessor, HashValue, PeerId, SecretKey, Signature};
use crate::params::codec;

#[derive(Debug, Error)]
pub enum ConfirmationError {
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("confirmation codec: {0}")]
    Codec(#[from] bincode::Error),
}

/// The signed fields of a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationPayload {
    /// Receiver-signed proof that a payment landed.
    Payment {
        kernel_id: HashValue,
        sender: PeerId,
        value: Amount,
        asset_id: AssetId,
    },
    /// Publisher-signed swap offer.
    SwapOffer { offer_data: Vec<u8> },
    /// Arbitrary data countersigned by a wallet.
    Undersign { data: Vec<u8> },
}

impl ConfirmationPayload {
    pub fn hash(&self) -> HashValue {
        match self {
            Self::Payment {
                kernel_id,
                sender,
                value,
                asset_id,
            } => {
                let hp = HashProcessor::new()
                    .label("PaymentConfirmation")
                    .raw(kernel_id)
                    .raw(sender.as_bytes())
                    .u64(*value);
                // The native coin keeps the historical recipe.
                if *asset_id != 0 {
                    hp.label("asset").u32(*asset_id).finalize()
                } else {
                    hp.finalize()
                }
            }
            Self::SwapOffer { offer_data } => HashProcessor::new()
                .label("SwapOfferSignature")
                .blob(offer_data)
                .finalize(),
            Self::Undersign { data } => HashProcessor::new().label("Undersign").blob(data).finalize(),
        }
    }
}

/// A payload together with its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub payload: ConfirmationPayload,
    pub signature: Signature,
}

impl Confirmation {
    /// Unsigned confirmation. Fails verification until [`Self::sign`].
    pub fn new(payload: ConfirmationPayload) -> Self {
        Self {
            payload,
            signature: Signature::default(),
        }
    }

    pub fn sign(&mut self, sk: &SecretKey) {
        self.signature = Signature::sign(&self.payload.hash(), sk.scalar());
    }

    /// Check the signature against the claimed signer. A key that does not
    /// decode to a non-identity point never validates.
    pub fn is_valid(&self, signer: &PeerId) -> bool {
        let Some(pk) = signer.export_nnz() else {
            return false;
        };
        self.signature.is_valid(&self.payload.hash(), &pk)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfirmationError> {
        Ok(codec::encode(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfirmationError> {
        Ok(codec::decode(bytes)?)
    }

    pub fn to_hex(&self) -> Result<String, ConfirmationError> {
        Ok(hex::encode(self.to_bytes()?))
    }

    pub fn from_hex(s: &str) -> Result<Self, ConfirmationError> {
        let bytes = hex::decode(s).map_err(|_| ConfirmationError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(value: Amount, asset_id: AssetId, kernel_id: HashValue, sender: PeerId) -> ConfirmationPayload {
        ConfirmationPayload::Payment {
            kernel_id,
            sender,
            value,
            asset_id,
        }
    }

    fn signed_payment() -> (Confirmation, SecretKey, PeerId) {
        let receiver = SecretKey::random();
        let sender = SecretKey::random().public_key();
        let mut c = Confirmation::new(payment(1_000, 0, [3u8; 32], sender));
        c.sign(&receiver);
        (c, receiver, sender)
    }

    #[test]
    fn signed_payment_verifies() {
        let (c, receiver, _) = signed_payment();
        assert!(c.is_valid(&receiver.public_key()));
        assert!(!c.is_valid(&SecretKey::random().public_key()));
    }

    #[test]
    fn changing_any_field_breaks_the_signature() {
        let (c, receiver, sender) = signed_payment();
        let signer = receiver.public_key();

        for payload in [
            payment(1_001, 0, [3u8; 32], sender),
            payment(1_000, 0, [4u8; 32], sender),
            payment(1_000, 0, [3u8; 32], SecretKey::random().public_key()),
            payment(1_000, 1, [3u8; 32], sender),
        ] {
            let forged = Confirmation {
                payload,
                signature: c.signature,
            };
            assert!(!forged.is_valid(&signer));
        }
    }

    #[test]
    fn asset_confirmation_does_not_transfer_between_assets() {
        let receiver = SecretKey::random();
        let sender = SecretKey::random().public_key();
        let mut c = Confirmation::new(payment(10, 5, [1u8; 32], sender));
        c.sign(&receiver);
        assert!(c.is_valid(&receiver.public_key()));

        let forged = Confirmation {
            payload: payment(10, 6, [1u8; 32], sender),
            signature: c.signature,
        };
        assert!(!forged.is_valid(&receiver.public_key()));
    }

    #[test]
    fn variants_have_distinct_domains() {
        let data = vec![1, 2, 3];
        let offer = ConfirmationPayload::SwapOffer { offer_data: data.clone() };
        let under = ConfirmationPayload::Undersign { data };
        assert_ne!(offer.hash(), under.hash());
    }

    #[test]
    fn identity_signer_is_rejected() {
        let (c, _, _) = signed_payment();
        assert!(!c.is_valid(&PeerId::default()));
    }

    #[test]
    fn unsigned_confirmation_is_invalid() {
        let c = Confirmation::new(ConfirmationPayload::Undersign { data: vec![9] });
        assert!(!c.is_valid(&SecretKey::random().public_key()));
    }

    #[test]
    fn hex_export_roundtrip() {
        let (c, receiver, _) = signed_payment();
        let back = Confirmation::from_hex(&c.to_hex().unwrap()).unwrap();
        assert_eq!(back, c);
        assert!(back.is_valid(&receiver.public_key()));
        assert!(matches!(Confirmation::from_hex("zz"), Err(ConfirmationError::InvalidHex)));
    }
}
