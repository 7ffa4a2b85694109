//! Order state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──markAsPaid──► Paid ──complete──► Completed ──refund──► Refunded
///    │                     │  └──────────────refund──────────────────▲
///    └──────cancel─────────┴──cancel──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, awaiting payment.
    #[default]
    Pending,

    /// Payment captured, awaiting shipment.
    Paid,

    /// Shipment confirmed.
    Completed,

    /// Order was cancelled (terminal state).
    Cancelled,

    /// Payment was returned (terminal state).
    Refunded,
}

impl OrderStatus {
    /// Returns true if the order can be marked as paid in this status.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be completed in this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if the order can be refunded in this status.
    pub fn can_refund(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Completed)
    }

    /// Returns true if the order can be cancelled in this status.
    ///
    /// Only completed and refunded orders are protected; a paid order can be
    /// cancelled without reversing its payment.
    pub fn can_cancel(&self) -> bool {
        !matches!(self, OrderStatus::Completed | OrderStatus::Refunded)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
