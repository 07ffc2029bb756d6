//! Order commands.

use common::EntityId;
use cqrs::Command;
use serde::{Deserialize, Serialize};

use super::SaleMethod;
use crate::money::DEFAULT_CURRENCY;

/// Customer details as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Shipping address as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInput {
    pub city: String,
    pub street: String,
    pub postal_code: String,
}

/// Command to place a new order.
///
/// The sale method, customer and address are required; a missing one is a
/// fatal argument error rather than a business failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    /// The order ID to create. Generated when omitted.
    #[serde(default)]
    pub order_id: EntityId,

    #[serde(default)]
    pub sale_method: Option<SaleMethod>,

    #[serde(default)]
    pub customer: Option<CustomerInput>,

    #[serde(default)]
    pub address: Option<AddressInput>,
}

impl CreateOrder {
    /// Creates a command with every argument supplied.
    pub fn new(sale_method: SaleMethod, customer: CustomerInput, address: AddressInput) -> Self {
        Self {
            order_id: EntityId::new(),
            sale_method: Some(sale_method),
            customer: Some(customer),
            address: Some(address),
        }
    }
}

impl Command for CreateOrder {
    const NAME: &'static str = "CreateOrder";
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_quantity() -> u32 {
    1
}

/// Command to add a product line to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddOrderLine {
    pub order_id: EntityId,
    pub product_id: EntityId,

    /// Unit price in minor units.
    pub unit_price: i64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Per-unit discount in minor units.
    #[serde(default)]
    pub discount: i64,
}

impl AddOrderLine {
    pub fn new(order_id: EntityId, product_id: EntityId, unit_price: i64, quantity: u32) -> Self {
        Self {
            order_id,
            product_id,
            unit_price,
            currency: default_currency(),
            quantity,
            discount: 0,
        }
    }

    pub fn with_discount(mut self, discount: i64) -> Self {
        self.discount = discount;
        self
    }
}

impl Command for AddOrderLine {
    const NAME: &'static str = "AddOrderLine";
}

/// Command to attach a note to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddOrderNote {
    pub order_id: EntityId,
    pub content: String,
}

impl AddOrderNote {
    pub fn new(order_id: EntityId, content: impl Into<String>) -> Self {
        Self {
            order_id,
            content: content.into(),
        }
    }
}

impl Command for AddOrderNote {
    const NAME: &'static str = "AddOrderNote";
}

macro_rules! status_command {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
        pub struct $name {
            pub order_id: EntityId,
        }

        impl $name {
            pub fn new(order_id: EntityId) -> Self {
                Self { order_id }
            }
        }

        impl Command for $name {
            const NAME: &'static str = stringify!($name);
        }
    };
}

status_command!(
    /// Command to start preparing a pending order.
    PrepareOrder
);
status_command!(
    /// Command to record payment for an order in preparation.
    MarkOrderPaid
);
status_command!(
    /// Command to ship a paid order.
    ShipOrder
);
status_command!(
    /// Command to complete a paid or shipped order.
    ClearOrder
);
status_command!(
    /// Command to cancel an order.
    CancelOrder
);
