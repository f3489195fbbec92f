//! # Domain-Tagged Hashing
//!
//! Every signed statement in the wallet is a SHA-256 digest over a fixed
//! ASCII label followed by the statement's fields. The label is what keeps a
//! signature produced for one protocol from being replayed in another, so
//! every construction gets its own.
//!
//! [`HashProcessor`] writes fields in a canonical form:
//!
//! - labels: UTF-8 bytes followed by a zero terminator,
//! - integers: big-endian, fixed width,
//! - fixed-size values (ids, keys): raw bytes,
//! - variable-size blobs: 4-byte big-endian length, then the bytes.
//!
//! The length prefix on blobs means two different field sequences can never
//! serialize to the same byte stream.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use sha2::{Digest, Sha256, Sha512};

/// A 32-byte digest.
pub type HashValue = [u8; 32];

/// Incremental, field-aware SHA-256 hasher.
///
/// ```
/// use nova_wallet::crypto::HashProcessor;
///
/// let a = HashProcessor::new().label("Demo").u64(7).finalize();
/// let b = HashProcessor::new().label("Demo").u64(8).finalize();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Default)]
pub struct HashProcessor {
    inner: Sha256,
}

impl HashProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a domain label.
    pub fn label(mut self, label: &str) -> Self {
        self.inner.update(label.as_bytes());
        self.inner.update([0u8]);
        self
    }

    /// Write a fixed-size value verbatim.
    pub fn raw(mut self, data: &[u8]) -> Self {
        self.inner.update(data);
        self
    }

    /// Write a variable-size blob with its length.
    pub fn blob(mut self, data: &[u8]) -> Self {
        self.inner.update((data.len() as u32).to_be_bytes());
        self.inner.update(data);
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.inner.update(value.to_be_bytes());
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.inner.update(value.to_be_bytes());
        self
    }

    pub fn finalize(self) -> HashValue {
        let digest = self.inner.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }
}

/// Map a label and a list of parts to a uniformly distributed scalar.
///
/// Uses SHA-512 so the wide reduction modulo the group order has no
/// measurable bias.
pub fn hash_to_scalar(label: &str, parts: &[&[u8]]) -> Scalar {
    Scalar::from_bytes_mod_order_wide(&wide_digest(label, parts))
}

/// Map a label and a list of parts to a Ristretto point with unknown
/// discrete log relative to the base point.
pub fn hash_to_point(label: &str, parts: &[&[u8]]) -> RistrettoPoint {
    RistrettoPoint::from_uniform_bytes(&wide_digest(label, parts))
}

fn wide_digest(label: &str, parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(label.as_bytes());
    hasher.update([0u8]);
    for part in parts {
        hasher.update((part.len() as u32).to_be_bytes());
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_changes_digest() {
        let a = HashProcessor::new().label("PaymentConfirmation").u64(1).finalize();
        let b = HashProcessor::new().label("SwapOfferSignature").u64(1).finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn blob_boundaries_are_unambiguous() {
        // "ab" + "c" must not collide with "a" + "bc".
        let a = HashProcessor::new().blob(b"ab").blob(b"c").finalize();
        let b = HashProcessor::new().blob(b"a").blob(b"bc").finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn processor_is_deterministic() {
        let make = || {
            HashProcessor::new()
                .label("x")
                .raw(&[1, 2, 3])
                .u32(9)
                .finalize()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn hash_to_scalar_separates_domains() {
        assert_ne!(hash_to_scalar("a", &[&b"x"[..]]), hash_to_scalar("b", &[&b"x"[..]]));
        assert_eq!(hash_to_scalar("a", &[&b"x"[..]]), hash_to_scalar("a", &[&b"x"[..]]));
    }

    #[test]
    fn hash_to_point_is_not_identity() {
        use curve25519_dalek::traits::IsIdentity;
        assert!(!hash_to_point("nova.generator", &[]).is_identity());
    }
}
