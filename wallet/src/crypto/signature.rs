//! # Schnorr Signatures over Ristretto
//!
//! Signing and verification are schnorrkel's. This module only adapts it to
//! the wallet's keys: a secret is a bare [`Scalar`] (kernel excesses are
//! sums of blinding factors, not derived key pairs), and a public key is any
//! [`RistrettoPoint`] `x·G`.
//!
//! The nonce half of the schnorrkel secret is derived from the scalar, so a
//! key never needs stored nonce material of its own.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use schnorrkel::{PublicKey, SecretKey as SchnorrSecret};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::hash::HashValue;

const SIGNING_CONTEXT: &[u8] = b"nova.schnorr";
const NONCE_CONTEXT: &str = "nova 2026 schnorr nonce seed";

/// A Schnorr signature over a 32-byte digest. The default value is the
/// placeholder of an unsigned object and never verifies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(Option<schnorrkel::Signature>);

impl Signature {
    /// Sign a 32-byte message digest with secret scalar `sk`.
    pub fn sign(msg: &HashValue, sk: &Scalar) -> Self {
        let Some(secret) = secret_key(sk) else {
            warn!("secret scalar rejected by the signer");
            return Self::default();
        };
        let public = secret.to_public();
        Self(Some(secret.sign_simple(SIGNING_CONTEXT, msg, &public)))
    }

    /// Verify against an already-validated public point.
    pub fn is_valid(&self, msg: &HashValue, pk: &RistrettoPoint) -> bool {
        let Some(signature) = &self.0 else {
            return false;
        };
        PublicKey::from_point(*pk)
            .verify_simple(SIGNING_CONTEXT, msg, signature)
            .is_ok()
    }
}

fn secret_key(sk: &Scalar) -> Option<SchnorrSecret> {
    let mut bytes = [0u8; 64];
    bytes[..32].copy_from_slice(sk.as_bytes());
    bytes[32..].copy_from_slice(&blake3::derive_key(NONCE_CONTEXT, sk.as_bytes()));
    // Canonical scalar bytes always parse.
    SchnorrSecret::from_bytes(&bytes).ok()
}
