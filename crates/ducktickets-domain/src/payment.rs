//! Payment status as tracked locally.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Local payment status.
///
/// `pending` is the only non-terminal status. A stored terminal status is never
/// overwritten, so redelivered or reordered provider events cannot regress it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Parse the stored representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Map a provider status string onto the local set.
    ///
    /// In-flight provider states (`in_process`, `authorized`, `in_mediation`)
    /// collapse to `pending`; `charged_back` counts as `refunded`.
    pub fn from_provider(value: &str) -> Option<Self> {
        match value {
            "pending" | "in_process" | "authorized" | "in_mediation" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            "refunded" | "charged_back" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Rejected or cancelled by the payer/provider.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }

    /// Whether a stored `self` may be replaced by `incoming`.
    pub fn accepts(self, incoming: Self) -> bool {
        !self.is_terminal() && (incoming.is_terminal() || incoming == self)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
