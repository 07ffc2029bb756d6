//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{EntityId, Outcome};
use serde::{Deserialize, Serialize};
use store::Entity;

use super::{Address, Customer, OrderHistory, OrderLine, OrderNote, OrderStatus, SaleMethod};
use crate::money::{Money, Price};

pub const ORDER_TOTAL_OUT_OF_RANGE: &str = "Order total is out of range.";

/// Order aggregate.
///
/// State changes only through methods that check their preconditions and
/// return an [`Outcome`]. A failed operation leaves the order untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: EntityId,
    status: OrderStatus,
    sale_method: SaleMethod,
    customer: Customer,
    shipping_address: Address,
    placed_at: DateTime<Utc>,
    lines: Vec<OrderLine>,
    notes: Vec<OrderNote>,
    histories: Vec<OrderHistory>,
}

impl Entity for Order {
    const ENTITY_TYPE: &'static str = "Order";

    fn id(&self) -> EntityId {
        self.id
    }
}

// Query methods
impl Order {
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn sale_method(&self) -> &SaleMethod {
        &self.sale_method
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn notes(&self) -> &[OrderNote] {
        &self.notes
    }

    /// Status transitions, oldest first.
    pub fn histories(&self) -> &[OrderHistory] {
        &self.histories
    }

    /// Sum of every line total. [`Order::add_line`] keeps the sum in range.
    pub fn total(&self) -> Money {
        self.lines
            .iter()
            .map(OrderLine::total)
            .fold(Money::zero(), Money::saturating_add)
    }

    /// Currency of the order's lines, if it has any.
    pub fn currency(&self) -> Option<&str> {
        self.lines
            .first()
            .map(|line| line.unit_price().currency.as_str())
    }
}

// Operations
impl Order {
    /// Places a new pending order at `placed_at`.
    pub fn create(
        id: EntityId,
        sale_method: SaleMethod,
        customer: Customer,
        shipping_address: Address,
        placed_at: DateTime<Utc>,
    ) -> Outcome<Order> {
        Outcome::ok_with(Self {
            id,
            status: OrderStatus::Pending,
            sale_method,
            customer,
            shipping_address,
            placed_at,
            lines: Vec::new(),
            notes: Vec::new(),
            histories: Vec::new(),
        })
    }

    /// Adds a product line. Every line of an order shares one currency and
    /// the order total must stay in range.
    pub fn add_line(
        &mut self,
        product_id: EntityId,
        unit_price: Price,
        quantity: u32,
        discount: Money,
    ) -> Outcome {
        if let Some(currency) = self.currency() {
            if currency != unit_price.currency {
                return Outcome::fail(format!(
                    "Order lines must be priced in {currency}, not {}.",
                    unit_price.currency
                ));
            }
        }

        OrderLine::create(product_id, unit_price, quantity, discount).then(|line| {
            let lines = self.lines.iter().chain([&line]);
            if Money::checked_sum(lines.map(OrderLine::total)).is_none() {
                return Outcome::fail(ORDER_TOTAL_OUT_OF_RANGE);
            }
            self.lines.push(line);
            Outcome::ok()
        })
    }

    pub fn add_note(&mut self, content: impl Into<String>) -> Outcome {
        OrderNote::create(content).then_do(|note| self.notes.push(note))
    }

    /// Pending → Preparation.
    pub fn prepare(&mut self, at: DateTime<Utc>) -> Outcome {
        self.transition(self.status.can_prepare(), OrderStatus::Preparation, at)
    }

    /// Preparation → Paid, once payment is confirmed.
    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> Outcome {
        self.transition(self.status.can_mark_paid(), OrderStatus::Paid, at)
    }

    /// Any status except Pending → Cancelled.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Outcome {
        self.transition(self.status.can_cancel(), OrderStatus::Cancelled, at)
    }

    /// Paid or Shipped → Completed.
    pub fn clear(&mut self, at: DateTime<Utc>) -> Outcome {
        self.transition(self.status.can_clear(), OrderStatus::Completed, at)
    }

    /// Paid → Shipped, when the sale method ships goods.
    pub fn ship(&mut self, at: DateTime<Utc>) -> Outcome {
        let allowed = self.status.can_ship() && self.sale_method.shipment_enabled();
        self.transition(allowed, OrderStatus::Shipped, at)
    }

    fn transition(&mut self, allowed: bool, target: OrderStatus, at: DateTime<Utc>) -> Outcome {
        if !allowed {
            return Outcome::fail(format!(
                "Is not possible to change the order status from {} to {}.",
                self.status, target
            ));
        }

        self.histories
            .push(OrderHistory::new(self.status, target, at));
        self.status = target;
        Outcome::ok()
    }
}
