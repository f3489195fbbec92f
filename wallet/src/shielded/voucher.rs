//! Shielded vouchers and tickets.
//!
//! The receiver's key keeper pre-issues vouchers. Each carries a one-time
//! serial key and a recovery tag that only the receiver's viewer can
//! recognize, and is signed by the receiver's wallet identity so a sender
//! can check it really comes from the peer it is paying.

use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

use crate::crypto::{hash_to_scalar, HashProcessor, HashValue, PeerId, Signature};

/// The public part of a shielded output: what ends up on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShieldedTicket {
    pub serial_pub: PeerId,
    pub recovery_tag: HashValue,
}

/// A receiver-issued permit to create one shielded output for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldedVoucher {
    pub ticket: ShieldedTicket,
    pub shared_secret: HashValue,
    pub signature: Signature,
}

/// Ordered as issued. Senders consume from the back.
pub type ShieldedVoucherList = Vec<ShieldedVoucher>;

impl ShieldedVoucher {
    /// Digest the issuer signs.
    pub fn hash(&self) -> HashValue {
        HashProcessor::new()
            .label("ShieldedVoucher")
            .raw(self.ticket.serial_pub.as_bytes())
            .raw(&self.ticket.recovery_tag)
            .raw(&self.shared_secret)
            .finalize()
    }

    /// Check the issuer signature against the receiver's wallet identity.
    pub fn is_valid(&self, issuer: &PeerId) -> bool {
        if !self.ticket.serial_pub.is_valid() {
            return false;
        }
        match issuer.export_nnz() {
            Some(pk) => self.signature.is_valid(&self.hash(), &pk),
            None => false,
        }
    }

    /// Blinding factor of the output built from this voucher. Both sender
    /// and receiver can compute it.
    pub fn output_blinding(&self) -> Scalar {
        output_blinding(&self.shared_secret)
    }
}

pub fn output_blinding(shared_secret: &HashValue) -> Scalar {
    hash_to_scalar("nova.shielded.blind", &[&shared_secret[..]])
}

/// The owner's viewing key. Recognizes tickets issued for this wallet
/// without being able to spend them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    key: [u8; 32],
}

impl Viewer {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn recovery_tag(&self, serial_pub: &PeerId) -> HashValue {
        HashProcessor::new()
            .label("nova.shielded.tag")
            .raw(&self.key)
            .raw(serial_pub.as_bytes())
            .finalize()
    }

    pub fn shared_secret(&self, serial_pub: &PeerId) -> HashValue {
        HashProcessor::new()
            .label("nova.shielded.secret")
            .raw(&self.key)
            .raw(serial_pub.as_bytes())
            .finalize()
    }

    /// Shared secret of `ticket` if this viewer issued it.
    pub fn recover(&self, ticket: &ShieldedTicket) -> Option<HashValue> {
        if self.recovery_tag(&ticket.serial_pub) == ticket.recovery_tag {
            Some(self.shared_secret(&ticket.serial_pub))
        } else {
            None
        }
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Viewer(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;

    fn issue(viewer: &Viewer, issuer: &SecretKey) -> ShieldedVoucher {
        let serial_pub = SecretKey::random().public_key();
        let mut voucher = ShieldedVoucher {
            ticket: ShieldedTicket {
                serial_pub,
                recovery_tag: viewer.recovery_tag(&serial_pub),
            },
            shared_secret: viewer.shared_secret(&serial_pub),
            signature: Signature::default(),
        };
        voucher.signature = Signature::sign(&voucher.hash(), issuer.scalar());
        voucher
    }

    #[test]
    fn voucher_verifies_against_issuer_only() {
        let issuer = SecretKey::random();
        let voucher = issue(&Viewer::new([1u8; 32]), &issuer);
        assert!(voucher.is_valid(&issuer.public_key()));
        assert!(!voucher.is_valid(&SecretKey::random().public_key()));
        assert!(!voucher.is_valid(&PeerId::default()));
    }

    #[test]
    fn tampered_secret_breaks_signature() {
        let issuer = SecretKey::random();
        let mut voucher = issue(&Viewer::new([1u8; 32]), &issuer);
        voucher.shared_secret[0] ^= 1;
        assert!(!voucher.is_valid(&issuer.public_key()));
    }

    #[test]
    fn only_the_issuing_viewer_recovers() {
        let mine = Viewer::new([1u8; 32]);
        let theirs = Viewer::new([2u8; 32]);
        let voucher = issue(&mine, &SecretKey::random());
        assert_eq!(mine.recover(&voucher.ticket), Some(voucher.shared_secret));
        assert_eq!(theirs.recover(&voucher.ticket), None);
    }
}
