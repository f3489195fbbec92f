//! # Cryptographic Composition
//!
//! The wallet does not implement curve arithmetic. Ristretto points and
//! scalars come from `curve25519-dalek`, Schnorr signing and verification
//! from `schnorrkel`, digests from `sha2` and `blake3`.
//! This module only composes them into the handful of constructions the
//! transaction protocol needs:
//!
//! - **hash**: domain-tagged hashing of semantic fields, hash-to-scalar and
//!   hash-to-point.
//! - **keys**: public key encoding ([`PeerId`]), secret keys, and the
//!   seed-based key derivation function used by the key keeper.
//! - **signature**: schnorrkel signatures under bare scalar keys.
//! - **commitment**: Pedersen commitments with per-asset value generators.
//!
//! Key bytes are never logged. If you add logging to this module, log
//! public points only.

pub mod commitment;
pub mod hash;
pub mod keys;
pub mod signature;

pub use commitment::{commit, value_generator};
pub use hash::{hash_to_point, hash_to_scalar, HashProcessor, HashValue};
pub use keys::{Kdf, PeerId, SecretKey};
pub use signature::Signature;
