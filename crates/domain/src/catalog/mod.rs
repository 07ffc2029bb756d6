//! Product catalog.

mod commands;
mod handlers;
mod product;
mod queries;

pub use commands::{CreateProduct, ProductPriceInput, RemoveProduct};
pub use handlers::{CatalogHandlers, PRODUCT_ALREADY_EXISTS, PRODUCT_NOT_FOUND};
pub use product::{Product, ProductPrice};
pub use queries::{GetProduct, ListProducts};
