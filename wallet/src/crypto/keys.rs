//! # Key Types
//!
//! - [`PeerId`]: a compressed Ristretto public key as it travels on the
//!   wire. It is only usable once [`PeerId::export_nnz`] proves it decodes
//!   to a non-identity point.
//! - [`SecretKey`]: a secret scalar. Lives inside the key keeper and never
//!   crosses the trust boundary.
//! - [`Kdf`]: deterministic derivation of scalars and byte strings from a
//!   32-byte master seed, using BLAKE3's `derive_key` mode for domain
//!   separation.

use std::fmt;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid public key encoding")]
    InvalidPublicKey,
}

// ---------------------------------------------------------------------------
// PeerId
// ---------------------------------------------------------------------------

/// A public key in compressed form.
///
/// Ordering and hashing work on the encoded bytes, which is what the address
/// book and wallet-id comparison need.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId([u8; 32]);

impl PeerId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_point(point: &RistrettoPoint) -> Self {
        Self(point.compress().to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Decode to a curve point, rejecting invalid encodings and the identity.
    pub fn export_nnz(&self) -> Option<RistrettoPoint> {
        CompressedRistretto(self.0)
            .decompress()
            .filter(|point| !point.is_identity())
    }

    pub fn is_valid(&self) -> bool {
        self.export_nnz().is_some()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// SecretKey
// ---------------------------------------------------------------------------

/// A secret scalar.
///
/// Deliberately not `Serialize`. Debug output shows the public key only.
#[derive(Clone)]
pub struct SecretKey(Scalar);

impl SecretKey {
    pub fn from_scalar(scalar: Scalar) -> Self {
        Self(scalar)
    }

    /// Sample a fresh key from the OS RNG.
    pub fn random() -> Self {
        Self(random_scalar())
    }

    pub fn scalar(&self) -> &Scalar {
        &self.0
    }

    pub fn public_point(&self) -> RistrettoPoint {
        RistrettoPoint::mul_base(&self.0)
    }

    pub fn public_key(&self) -> PeerId {
        PeerId::from_point(&self.public_point())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(pub={})", self.public_key().to_hex())
    }
}

/// Uniformly random scalar from the OS RNG.
pub fn random_scalar() -> Scalar {
    let mut wide = [0u8; 64];
    rand::rngs::OsRng.fill_bytes(&mut wide);
    Scalar::from_bytes_mod_order_wide(&wide)
}

// ---------------------------------------------------------------------------
// Kdf
// ---------------------------------------------------------------------------

/// Seed-based key derivation.
///
/// `context` names the key family (identity keys, coin blinding factors,
/// voucher serials), `index` selects the member. Different contexts never
/// yield related keys.
#[derive(Clone)]
pub struct Kdf {
    seed: [u8; 32],
}

impl Kdf {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { seed }
    }

    pub fn random() -> Self {
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self { seed }
    }

    pub fn derive_scalar(&self, context: &str, index: &[u8]) -> Scalar {
        let mut wide = [0u8; 64];
        self.reader(context, index).fill(&mut wide);
        Scalar::from_bytes_mod_order_wide(&wide)
    }

    pub fn derive_key(&self, context: &str, index: &[u8]) -> SecretKey {
        SecretKey::from_scalar(self.derive_scalar(context, index))
    }

    pub fn derive_bytes(&self, context: &str, index: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.reader(context, index).fill(&mut out);
        out
    }

    /// Child KDF, e.g. the viewing-key tree under the owner seed.
    pub fn child(&self, context: &str) -> Kdf {
        Kdf::from_seed(self.derive_bytes(context, &[]))
    }

    fn reader(&self, context: &str, index: &[u8]) -> blake3::OutputReader {
        let mut hasher = blake3::Hasher::new_derive_key(context);
        hasher.update(&self.seed);
        hasher.update(&(index.len() as u32).to_be_bytes());
        hasher.update(index);
        hasher.finalize_xof()
    }
}

impl fmt::Debug for Kdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Kdf(..)")
    }
}
