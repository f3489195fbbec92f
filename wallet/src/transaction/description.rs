//! The transaction record users and APIs see.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Amount, AssetId, TxId, WalletId};
use crate::crypto::HashValue;
use crate::params::{TxParameterId, TxParameters};

use super::error::TxFailureReason;

// ---------------------------------------------------------------------------
// TxType
// ---------------------------------------------------------------------------

/// Kind of transaction. Only push transactions are built by this crate;
/// the other tags exist so foreign tokens can be recognized and refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    Simple,
    AtomicSwap,
    PushTransaction,
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "Simple"),
            Self::AtomicSwap => write!(f, "AtomicSwap"),
            Self::PushTransaction => write!(f, "PushTransaction"),
        }
    }
}

// ---------------------------------------------------------------------------
// TxStatus
// ---------------------------------------------------------------------------

/// ```text
/// Pending → InProgress → Registering → Completed
///    └──────────┴────────────┴──────→ Canceled | Failed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    #[default]
    Pending,
    InProgress,
    Canceled,
    Completed,
    Failed,
    Registering,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Failed)
    }
}

// ---------------------------------------------------------------------------
// TxDescription
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxDescription {
    pub tx_id: TxId,
    pub tx_type: TxType,
    pub amount: Amount,
    pub fee: Amount,
    pub asset_id: AssetId,
    pub my_id: WalletId,
    pub peer_id: WalletId,
    pub message: Vec<u8>,
    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,
    pub sender: bool,
    pub self_tx: bool,
    pub status: TxStatus,
    pub failure_reason: TxFailureReason,
    pub kernel_id: Option<HashValue>,
}

impl TxDescription {
    pub fn new(tx_id: TxId, tx_type: TxType) -> Self {
        let now = Utc::now();
        Self {
            tx_id,
            tx_type,
            amount: 0,
            fee: 0,
            asset_id: 0,
            my_id: WalletId::default(),
            peer_id: WalletId::default(),
            message: Vec::new(),
            create_time: now,
            modify_time: now,
            sender: false,
            self_tx: false,
            status: TxStatus::Pending,
            failure_reason: TxFailureReason::Unknown,
            kernel_id: None,
        }
    }

    /// Build the record from the default sub-transaction's parameters.
    pub fn from_parameters(tx_id: TxId, tx_type: TxType, params: &TxParameters) -> Self {
        let mut desc = Self::new(tx_id, tx_type);
        desc.amount = params.get(TxParameterId::AMOUNT).unwrap_or(0);
        desc.fee = params.get(TxParameterId::FEE).unwrap_or(0);
        desc.asset_id = params.get(TxParameterId::ASSET_ID).unwrap_or(0);
        desc.my_id = params.get(TxParameterId::MY_ID).unwrap_or_default();
        desc.peer_id = params.get(TxParameterId::PEER_ID).unwrap_or_default();
        desc.message = params.get(TxParameterId::MESSAGE).unwrap_or_default();
        desc.sender = params.get(TxParameterId::IS_SENDER).unwrap_or(false);
        desc.self_tx = params.get(TxParameterId::IS_SELF_TX).unwrap_or(false);
        desc.status = params.get(TxParameterId::STATUS).unwrap_or_default();
        desc.failure_reason = params.get(TxParameterId::FAILURE_REASON).unwrap_or_default();
        desc.kernel_id = params.get(TxParameterId::KERNEL_ID);
        if let Some(secs) = params.get::<i64>(TxParameterId::CREATE_TIME) {
            if let Some(time) = DateTime::from_timestamp(secs, 0) {
                desc.create_time = time;
            }
        }
        desc
    }

    pub fn can_resume(&self) -> bool {
        matches!(
            self.status,
            TxStatus::Pending | TxStatus::InProgress | TxStatus::Registering
        )
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self.status, TxStatus::InProgress | TxStatus::Pending)
    }

    pub fn can_delete(&self) -> bool {
        matches!(
            self.status,
            TxStatus::Failed | TxStatus::Completed | TxStatus::Canceled
        )
    }

    /// Status wording for API consumers.
    pub fn status_string_api(&self) -> &'static str {
        match self.status {
            TxStatus::Pending => "pending",
            TxStatus::InProgress if self.self_tx => "self sending",
            TxStatus::InProgress if self.sender => "waiting for receiver",
            TxStatus::InProgress => "waiting for sender",
            TxStatus::Registering if self.self_tx => "self sending",
            TxStatus::Registering if self.sender => "sending",
            TxStatus::Registering => "receiving",
            TxStatus::Completed if self.self_tx => "completed",
            TxStatus::Completed if self.sender => "sent",
            TxStatus::Completed => "received",
            TxStatus::Canceled => "cancelled",
            TxStatus::Failed if self.failure_reason == TxFailureReason::TransactionExpired => "expired",
            TxStatus::Failed => "failed",
        }
    }

    /// Status wording for a UI.
    pub fn status_string(&self) -> &'static str {
        match self.status_string_api() {
            "receiving" | "sending" => "in progress",
            "completed" => "sent to own address",
            "self sending" => "sending to own address",
            other => other,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_status(status: TxStatus, sender: bool, self_tx: bool) -> TxDescription {
        let mut d = TxDescription::new(TxId::generate(), TxType::PushTransaction);
        d.status = status;
        d.sender = sender;
        d.self_tx = self_tx;
        d
    }

    #[test]
    fn completed_is_deletable_only() {
        let d = with_status(TxStatus::Completed, true, false);
        assert!(!d.can_resume());
        assert!(!d.can_cancel());
        assert!(d.can_delete());
    }

    #[test]
    fn capability_sets() {
        for status in [TxStatus::Pending, TxStatus::InProgress, TxStatus::Registering] {
            assert!(with_status(status, true, false).can_resume());
            assert!(!with_status(status, true, false).can_delete());
        }
        assert!(with_status(TxStatus::Pending, true, false).can_cancel());
        assert!(with_status(TxStatus::InProgress, true, false).can_cancel());
        assert!(!with_status(TxStatus::Registering, true, false).can_cancel());
        assert!(with_status(TxStatus::Canceled, true, false).can_delete());
    }

    #[test]
    fn expired_failure_reads_expired() {
        let mut d = with_status(TxStatus::Failed, true, false);
        d.failure_reason = TxFailureReason::TransactionExpired;
        assert_eq!(d.status_string_api(), "expired");
        assert_eq!(d.status_string(), "expired");

        d.failure_reason = TxFailureReason::NoVouchers;
        assert_eq!(d.status_string_api(), "failed");
    }

    #[test]
    fn api_strings_depend_on_direction() {
        assert_eq!(with_status(TxStatus::Pending, true, false).status_string_api(), "pending");
        assert_eq!(with_status(TxStatus::InProgress, true, false).status_string_api(), "waiting for receiver");
        assert_eq!(with_status(TxStatus::InProgress, false, false).status_string_api(), "waiting for sender");
        assert_eq!(with_status(TxStatus::Registering, true, false).status_string_api(), "sending");
        assert_eq!(with_status(TxStatus::Registering, false, false).status_string_api(), "receiving");
        assert_eq!(with_status(TxStatus::Completed, true, false).status_string_api(), "sent");
        assert_eq!(with_status(TxStatus::Completed, false, false).status_string_api(), "received");
        assert_eq!(with_status(TxStatus::Canceled, true, false).status_string_api(), "cancelled");
    }

    #[test]
    fn ui_strings_rename_self_and_in_flight_states() {
        assert_eq!(with_status(TxStatus::Registering, true, false).status_string(), "in progress");
        assert_eq!(with_status(TxStatus::Completed, true, true).status_string(), "sent to own address");
        assert_eq!(with_status(TxStatus::InProgress, true, true).status_string(), "sending to own address");
        assert_eq!(with_status(TxStatus::Completed, true, false).status_string(), "sent");
    }

    #[test]
    fn description_reads_parameters() {
        let id = TxId::generate();
        let mut params = TxParameters::new(Some(id));
        params
            .set(TxParameterId::AMOUNT, &42u64)
            .set(TxParameterId::IS_SENDER, &true)
            .set(TxParameterId::STATUS, &TxStatus::Registering)
            .set(TxParameterId::CREATE_TIME, &1_700_000_000i64);
        let d = TxDescription::from_parameters(id, TxType::PushTransaction, &params);
        assert_eq!(d.amount, 42);
        assert!(d.sender);
        assert_eq!(d.status, TxStatus::Registering);
        assert_eq!(d.create_time.timestamp(), 1_700_000_000);
        assert!(d.to_json().unwrap().contains("\"amount\":42"));
    }
}
