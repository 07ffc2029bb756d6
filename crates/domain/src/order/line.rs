//! Order lines.

use common::{EntityId, Outcome};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Price};

pub const LINE_TOTAL_OUT_OF_RANGE: &str = "Line total is out of range.";

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    product_id: EntityId,
    unit_price: Price,
    quantity: u32,
    discount: Money,
}

impl OrderLine {
    /// Creates a line, checking quantity, price and discount together.
    ///
    /// The discount applies per unit and must lie within `0..=unit price`.
    pub fn create(
        product_id: EntityId,
        unit_price: Price,
        quantity: u32,
        discount: Money,
    ) -> Outcome<OrderLine> {
        let mut errors = Vec::new();
        if quantity == 0 {
            errors.push("Quantity must be greater than zero.");
        }
        if unit_price.amount.is_negative() {
            errors.push("Unit price cannot be negative.");
        }
        if discount.is_negative() || discount > unit_price.amount {
            errors.push("Discount must be between zero and the unit price.");
        }
        if !errors.is_empty() {
            return Outcome::fail_many(errors);
        }
        if line_total(unit_price.amount, discount, quantity).is_none() {
            return Outcome::fail(LINE_TOTAL_OUT_OF_RANGE);
        }

        Outcome::ok_with(Self {
            product_id,
            unit_price,
            quantity,
            discount,
        })
    }

    pub fn product_id(&self) -> EntityId {
        self.product_id
    }

    pub fn unit_price(&self) -> &Price {
        &self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    /// `(unit price - discount) * quantity`.
    ///
    /// [`OrderLine::create`] rejects lines whose total overflows, so the
    /// clamping never applies to a created line.
    pub fn total(&self) -> Money {
        let net = self
            .unit_price
            .amount
            .checked_sub(self.discount)
            .unwrap_or(Money::zero());
        net.saturating_mul(self.quantity)
    }
}

fn line_total(unit_price: Money, discount: Money, quantity: u32) -> Option<Money> {
    unit_price.checked_sub(discount)?.checked_mul(quantity)
}
