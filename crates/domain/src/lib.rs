//! Business domain: orders, the product catalog and identity.
//!
//! Every request type is wired into a [`cqrs::Dispatcher`] by
//! [`build_dispatcher`] and exposed by name through [`build_router`].

pub mod catalog;
pub mod error;
pub mod identity;
pub mod money;
pub mod order;

use common::SharedClock;
use cqrs::{DispatchError, Dispatcher, JsonRouter, RouteError};
use store::EntityStore;

pub use error::DomainError;
pub use money::{Money, Price};

use catalog::{CatalogHandlers, CreateProduct, GetProduct, ListProducts, RemoveProduct};
use identity::{GetUserPermissions, IdentityHandlers};
use order::{
    AddOrderLine, AddOrderNote, CancelOrder, ClearOrder, CreateOrder, GetOrder, ListOrders,
    MarkOrderPaid, OrderHandlers, PrepareOrder, ShipOrder,
};

/// Registers every domain handler against `store`.
pub fn build_dispatcher<S>(store: S, clock: SharedClock) -> Result<Dispatcher, DispatchError>
where
    S: EntityStore + Clone + 'static,
{
    let orders = OrderHandlers::new(store.clone(), clock.clone());
    let catalog = CatalogHandlers::new(store.clone(), clock.clone());
    let identity = IdentityHandlers::new(store, clock);

    Dispatcher::builder()
        .command::<CreateOrder, _>(orders.clone())
        .command::<AddOrderLine, _>(orders.clone())
        .command::<AddOrderNote, _>(orders.clone())
        .command::<PrepareOrder, _>(orders.clone())
        .command::<MarkOrderPaid, _>(orders.clone())
        .command::<ShipOrder, _>(orders.clone())
        .command::<ClearOrder, _>(orders.clone())
        .command::<CancelOrder, _>(orders.clone())
        .query::<GetOrder, _>(orders.clone())
        .query::<ListOrders, _>(orders)
        .command::<CreateProduct, _>(catalog.clone())
        .command::<RemoveProduct, _>(catalog.clone())
        .query::<GetProduct, _>(catalog.clone())
        .query::<ListProducts, _>(catalog)
        .query::<GetUserPermissions, _>(identity)
        .build()
}

/// Exposes every domain request by its name.
pub fn build_router(dispatcher: Dispatcher) -> Result<JsonRouter, RouteError> {
    JsonRouter::builder(dispatcher)
        .command::<CreateOrder>()
        .command::<AddOrderLine>()
        .command::<AddOrderNote>()
        .command::<PrepareOrder>()
        .command::<MarkOrderPaid>()
        .command::<ShipOrder>()
        .command::<ClearOrder>()
        .command::<CancelOrder>()
        .query::<GetOrder>()
        .query::<ListOrders>()
        .command::<CreateProduct>()
        .command::<RemoveProduct>()
        .query::<GetProduct>()
        .query::<ListProducts>()
        .query::<GetUserPermissions>()
        .build()
}
