//! Domain Value Objects

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// 移送の状態
///
/// pending から accepted / rejected / cancelled のいずれかへ一度だけ遷移し、
/// 以後は変わりません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    #[display("pending")]
    Pending,
    #[display("accepted")]
    Accepted,
    #[display("rejected")]
    Rejected,
    #[display("cancelled")]
    Cancelled,
}

impl TransferStatus {
    pub const ALL: [TransferStatus; 4] = [
        TransferStatus::Pending,
        TransferStatus::Accepted,
        TransferStatus::Rejected,
        TransferStatus::Cancelled,
    ];

    pub const CODES: &'static [&'static str] = &["pending", "accepted", "rejected", "cancelled"];

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// 許される遷移は pending からの 3 つだけ
    pub const fn can_transition_to(&self, target: TransferStatus) -> bool {
        matches!(
            (self, target),
            (
                Self::Pending,
                Self::Accepted | Self::Rejected | Self::Cancelled
            )
        )
    }
}

/// 移送に対する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TransferAction {
    #[display("accept")]
    Accept,
    #[display("reject")]
    Reject,
    #[display("cancel")]
    Cancel,
}

impl TransferAction {
    pub const fn target(&self) -> TransferStatus {
        match self {
            Self::Accept => TransferStatus::Accepted,
            Self::Reject => TransferStatus::Rejected,
            Self::Cancel => TransferStatus::Cancelled,
        }
    }

    /// 受け取り側の操作か（cancel は送り元の操作）
    pub const fn is_receiver_side(&self) -> bool {
        matches!(self, Self::Accept | Self::Reject)
    }

    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Accept => "transfer.accepted",
            Self::Reject => "transfer.rejected",
            Self::Cancel => "transfer.cancelled",
        }
    }

    /// 要求された遷移先から操作を決める（pending への遷移は無い）
    pub fn for_target(target: TransferStatus) -> Option<Self> {
        match target {
            TransferStatus::Accepted => Some(Self::Accept),
            TransferStatus::Rejected => Some(Self::Reject),
            TransferStatus::Cancelled => Some(Self::Cancel),
            TransferStatus::Pending => None,
        }
    }
}
