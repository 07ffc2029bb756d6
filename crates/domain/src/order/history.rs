use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// Record of one status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistory {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
}

impl OrderHistory {
    pub fn new(from: OrderStatus, to: OrderStatus, at: DateTime<Utc>) -> Self {
        Self { from, to, at }
    }
}
