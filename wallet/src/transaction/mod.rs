//! # Transactions
//!
//! - **kernel**: the transaction model (inputs, outputs, kernels, offset)
//!   and its balance check.
//! - **description**: the user-visible record and its status machine.
//! - **error**: what can go wrong, and the reason persisted for it.
//! - **context**: parameters plus services, with write-through
//!   persistence.
//! - **builder** / **push_builder**: resumable construction steps.
//! - **push**: the [`PushTransaction`] driver the wallet loop updates.
//!
//! ## Flow of a push
//!
//! ```text
//! update()  ── select inputs ── commitments ── voucher ── invoke_async ──┐
//!                                                                       │
//! on_key_keeper_event()  ◄──────────── KeyKeeperEvent ──────────────────┘
//!    └─ on_signed ── verify ── register_tx ── on_registered ── Completed
//! ```

pub mod builder;
pub mod context;
pub mod description;
pub mod error;
pub mod kernel;
pub mod push;
pub mod push_builder;

pub use builder::{BaseTxBuilder, Stage};
pub use context::{TxContext, WalletServices};
pub use description::{TxDescription, TxStatus, TxType};
pub use error::{TxError, TxFailureReason};
pub use kernel::{Input, Output, ShieldedTxo, Transaction, TxKernel, ValidationError};
pub use push::PushTransaction;
pub use push_builder::PushTxBuilder;
