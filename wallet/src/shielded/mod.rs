//! # Shielded Outputs
//!
//! Vouchers, the tickets they turn into on chain, the owner's viewer that
//! recognizes its own tickets, and the wallet record of a shielded coin.

pub mod coin;
pub mod voucher;

pub use coin::{ShieldedCoin, ShieldedCoinStatus};
pub use voucher::{output_blinding, ShieldedTicket, ShieldedVoucher, ShieldedVoucherList, Viewer};
