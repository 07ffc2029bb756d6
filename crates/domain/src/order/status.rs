//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Preparation ──► Paid ──┬──► Shipped ──► Completed
///                  │            │    └──────────────► Completed
///                  └────────────┴──► Cancelled (from any non-Pending status)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order was placed and awaits preparation.
    #[default]
    Pending,

    /// Order is being prepared.
    Preparation,

    /// Order was cancelled.
    Cancelled,

    /// Payment was received.
    Paid,

    /// Order was handed to the carrier.
    Shipped,

    /// Order is settled.
    Completed,
}

impl OrderStatus {
    /// Returns true if the order can move to preparation.
    pub fn can_prepare(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if payment can be recorded.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, OrderStatus::Preparation)
    }

    /// Returns true if the order can be cancelled. A pending order cannot.
    pub fn can_cancel(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be cleared (completed).
    pub fn can_clear(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Shipped)
    }

    /// Returns true if the status allows shipping. The sale method must
    /// enable shipment as well.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Preparation => "Preparation",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
