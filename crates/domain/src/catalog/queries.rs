use common::{EntityId, PageRequest, PagedResult};
use cqrs::Query;
use serde::{Deserialize, Serialize};

use super::Product;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetProduct {
    pub product_id: EntityId,
}

impl GetProduct {
    pub fn new(product_id: EntityId) -> Self {
        Self { product_id }
    }
}

impl Query for GetProduct {
    const NAME: &'static str = "GetProduct";
    type Output = Product;
}

/// Lists products, oldest first.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ListProducts {
    #[serde(flatten)]
    pub page: PageRequest,
}

impl ListProducts {
    pub fn new(page: PageRequest) -> Self {
        Self { page }
    }
}

impl Query for ListProducts {
    const NAME: &'static str = "ListProducts";
    type Output = PagedResult<Product>;
}
