use std::collections::HashSet;

use common::{EntityId, Outcome};
use serde::{Deserialize, Serialize};
use store::Entity;

use crate::money::Money;

/// A price of a product under one price type (e.g. retail, wholesale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPrice {
    pub price_type_id: i64,
    pub price: Money,
}

impl ProductPrice {
    pub fn new(price_type_id: i64, price: Money) -> Self {
        Self {
            price_type_id,
            price,
        }
    }
}

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: EntityId,
    title: String,
    prices: Vec<ProductPrice>,
}

impl Entity for Product {
    const ENTITY_TYPE: &'static str = "Product";

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Product {
    /// Creates a product, reporting every rule it breaks.
    pub fn create(
        id: EntityId,
        title: impl Into<String>,
        prices: Vec<ProductPrice>,
    ) -> Outcome<Product> {
        let title = title.into().trim().to_string();
        let mut errors = Vec::new();

        if title.is_empty() {
            errors.push("Product title is required.".to_string());
        }
        if prices.is_empty() {
            errors.push("At least one price is required.".to_string());
        }

        let mut seen = HashSet::new();
        for price in &prices {
            if !seen.insert(price.price_type_id) {
                errors.push(format!(
                    "Price type {} is listed more than once.",
                    price.price_type_id
                ));
            }
            if price.price.is_negative() {
                errors.push(format!(
                    "Price for type {} cannot be negative.",
                    price.price_type_id
                ));
            }
        }

        if !errors.is_empty() {
            return Outcome::fail_many(errors);
        }
        Outcome::ok_with(Self { id, title, prices })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn prices(&self) -> &[ProductPrice] {
        &self.prices
    }

    /// Price under `price_type_id`, if the product has one.
    pub fn price_for(&self, price_type_id: i64) -> Option<Money> {
        self.prices
            .iter()
            .find(|p| p.price_type_id == price_type_id)
            .map(|p| p.price)
    }
}
