use common::EntityId;
use cqrs::Command;
use serde::{Deserialize, Serialize};

/// A price line as submitted, in minor units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPriceInput {
    pub price_type_id: i64,
    pub price: i64,
}

/// Adds a product to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    /// Generated when omitted.
    #[serde(default)]
    pub product_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub prices: Vec<ProductPriceInput>,
}

impl CreateProduct {
    pub fn new(title: impl Into<String>, prices: Vec<ProductPriceInput>) -> Self {
        Self {
            product_id: EntityId::new(),
            title: title.into(),
            prices,
        }
    }
}

impl Command for CreateProduct {
    const NAME: &'static str = "CreateProduct";
}

/// Removes a product from the catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RemoveProduct {
    pub product_id: EntityId,
}

impl RemoveProduct {
    pub fn new(product_id: EntityId) -> Self {
        Self { product_id }
    }
}

impl Command for RemoveProduct {
    const NAME: &'static str = "RemoveProduct";
}
