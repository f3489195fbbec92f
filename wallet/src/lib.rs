// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NOVA Wallet: Confidential Transaction Core
//!
//! The part of a NOVA wallet that turns "send X to Y" into a signed,
//! balanced confidential transaction, and keeps doing so correctly across
//! restarts, slow signers and peers that answer late.
//!
//! ## Architecture
//!
//! - **config**: protocol constants and the `Rules` table.
//! - **logging**: tracing subscriber setup.
//! - **crypto**: hashing, keys, Schnorr signatures, Pedersen commitments.
//! - **core**: identifiers and amount formatting.
//! - **params**: the typed parameter store and the payment token format.
//! - **confirmation**: signed payment proofs and other attestations.
//! - **shielded**: vouchers, tickets and shielded coin records.
//! - **keykeeper**: the signer contract and a software signer.
//! - **storage**: what the wallet database must provide.
//! - **gateway**: what the network must provide.
//! - **transaction**: kernels, builders and the push transaction driver.
//! - **wallet**: the loop that owns live transactions.
//!
//! ## Ground rules
//!
//! 1. Secret scalars live in the key keeper. Everything else sees points.
//! 2. Every step of a transaction is persisted before the next one starts.
//! 3. A key keeper request is answered exactly once, and a late answer for a
//!    transaction that moved on is dropped, not applied.

pub mod config;
pub mod confirmation;
pub mod core;
pub mod crypto;
pub mod gateway;
pub mod keykeeper;
pub mod logging;
pub mod params;
pub mod shielded;
pub mod storage;
pub mod transaction;
pub mod wallet;

pub use crate::config::Rules;
pub use crate::core::{Amount, AssetId, PeerId, SubTxId, TxId, WalletId};
pub use crate::params::{parse_parameters, TxParameterId, TxParameters, TxToken};
pub use crate::transaction::{PushTransaction, TxDescription, TxError, TxStatus};
pub use crate::wallet::{Wallet, WalletError};
