//! Order queries and read models.

use common::{EntityId, PageRequest, PagedResult};
use cqrs::Query;
use serde::{Deserialize, Serialize};

use super::{Order, OrderStatus};
use crate::money::Money;

/// Loads one order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetOrder {
    pub order_id: EntityId,
}

impl GetOrder {
    pub fn new(order_id: EntityId) -> Self {
        Self { order_id }
    }
}

impl Query for GetOrder {
    const NAME: &'static str = "GetOrder";
    type Output = Order;
}

/// Lists orders, oldest first.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ListOrders {
    #[serde(flatten)]
    pub page: PageRequest,
}

impl ListOrders {
    pub fn new(page: PageRequest) -> Self {
        Self { page }
    }
}

impl Query for ListOrders {
    const NAME: &'static str = "ListOrders";
    type Output = PagedResult<OrderSummary>;
}

/// List row for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: EntityId,
    pub status: OrderStatus,
    pub customer_name: String,
    pub line_count: usize,
    pub total: Money,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        use store::Entity;

        Self {
            id: order.id(),
            status: order.status(),
            customer_name: order.customer().name().to_string(),
            line_count: order.lines().len(),
            total: order.total(),
        }
    }
}
