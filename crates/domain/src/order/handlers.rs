//! Order command and query handlers.

use async_trait::async_trait;
use common::{EntityId, Outcome, PagedResult, SharedClock, UserSession, combine};
use cqrs::{BoxError, CommandHandler, QueryHandler};
use store::{EntityStore, StoreError, UnitOfWork};

use super::{
    AddOrderLine, AddOrderNote, Address, CancelOrder, ClearOrder, CreateOrder, Customer, GetOrder,
    ListOrders, MarkOrderPaid, Order, OrderSummary, PrepareOrder, ShipOrder,
};
use crate::catalog::{PRODUCT_NOT_FOUND, Product};
use crate::error::DomainError;
use crate::money::{Money, Price};

pub const ORDER_NOT_FOUND: &str = "Order not found.";
pub const ORDER_ALREADY_EXISTS: &str = "Order already exists.";

/// Handles every order request.
///
/// Each request runs in its own unit of work; concurrent writers to the same
/// order are arbitrated by the store's row-version check.
#[derive(Clone)]
pub struct OrderHandlers<S> {
    store: S,
    clock: SharedClock,
}

impl<S: EntityStore + Clone + 'static> OrderHandlers<S> {
    pub fn new(store: S, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    fn uow(&self, session: &UserSession) -> UnitOfWork<S> {
        UnitOfWork::new(self.store.clone(), session.clone(), self.clock.clone())
    }

    /// Places an order.
    ///
    /// Missing arguments are fatal and detected before anything is built or
    /// stored.
    #[tracing::instrument(skip(self, session))]
    pub async fn create_order(
        &self,
        session: &UserSession,
        command: CreateOrder,
    ) -> Result<Outcome, DomainError> {
        let sale_method = command
            .sale_method
            .ok_or(DomainError::argument_null("sale_method"))?;
        let customer = command
            .customer
            .ok_or(DomainError::argument_null("customer"))?;
        let address = command
            .address
            .ok_or(DomainError::argument_null("address"))?;

        let customer = Customer::new(customer.name, customer.phone);
        let address = Address::new(address.city, address.street, address.postal_code);

        // Report customer and address problems together
        let (customer, address) = match (customer, address) {
            (Outcome::Ok(customer), Outcome::Ok(address)) => (customer, address),
            (customer, address) => {
                let outcome = combine([customer.map(|_| ()), address.map(|_| ())]);
                return Ok(outcome.map(|_| ()));
            }
        };

        let placed_at = self.clock.now();
        let order = match Order::create(command.order_id, sale_method, customer, address, placed_at)
        {
            Outcome::Ok(order) => order,
            Outcome::Fail(failure) => return Ok(Outcome::Fail(failure)),
        };

        let mut uow = self.uow(session);
        if uow.set::<Order>().find(command.order_id).await?.is_some() {
            return Ok(Outcome::fail(ORDER_ALREADY_EXISTS));
        }
        uow.set::<Order>().add(&order)?;
        match uow.save_changes().await {
            Ok(_) => {}
            // Another request inserted the same id after our lookup
            Err(StoreError::DuplicateKey { .. }) => {
                tracing::info!(order_id = %command.order_id, "order created concurrently");
                return Ok(Outcome::fail(ORDER_ALREADY_EXISTS));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(order_id = %command.order_id, "order created");
        Ok(Outcome::ok())
    }

    #[tracing::instrument(skip(self, session))]
    pub async fn add_line(
        &self,
        session: &UserSession,
        command: AddOrderLine,
    ) -> Result<Outcome, DomainError> {
        let mut uow = self.uow(session);
        if uow.set::<Product>().find(command.product_id).await?.is_none() {
            return Ok(Outcome::fail(PRODUCT_NOT_FOUND));
        }

        let unit_price = Price::new(Money::from_cents(command.unit_price), command.currency);
        let discount = Money::from_cents(command.discount);
        let product_id = command.product_id;
        let quantity = command.quantity;

        self.modify(uow, command.order_id, |order| {
            order.add_line(product_id, unit_price, quantity, discount)
        })
        .await
    }

    /// Loads an order, applies `change`, and saves it if the change
    /// succeeded.
    async fn modify<F>(
        &self,
        mut uow: UnitOfWork<S>,
        order_id: EntityId,
        change: F,
    ) -> Result<Outcome, DomainError>
    where
        F: FnOnce(&mut Order) -> Outcome + Send,
    {
        let Some(mut order) = uow.set::<Order>().find(order_id).await? else {
            return Ok(Outcome::fail(ORDER_NOT_FOUND));
        };

        let outcome = change(&mut order);
        if outcome.is_fail() {
            tracing::debug!(%order_id, errors = ?outcome.errors(), "order change rejected");
            return Ok(outcome);
        }

        uow.set::<Order>().update(&order)?;
        uow.save_changes().await?;

        tracing::info!(%order_id, status = %order.status(), "order updated");
        Ok(outcome)
    }

    async fn modify_as<F>(
        &self,
        session: &UserSession,
        order_id: EntityId,
        change: F,
    ) -> Result<Outcome, DomainError>
    where
        F: FnOnce(&mut Order) -> Outcome + Send,
    {
        self.modify(self.uow(session), order_id, change).await
    }
}

#[async_trait]
impl<S: EntityStore + Clone + 'static> CommandHandler<CreateOrder> for OrderHandlers<S> {
    async fn handle(&self, session: &UserSession, command: CreateOrder) -> Result<Outcome, BoxError> {
        Ok(self.create_order(session, command).await?)
    }
}

#[async_trait]
impl<S: EntityStore + Clone + 'static> CommandHandler<AddOrderLine> for OrderHandlers<S> {
    async fn handle(
        &self,
        session: &UserSession,
        command: AddOrderLine,
    ) -> Result<Outcome, BoxError> {
        Ok(self.add_line(session, command).await?)
    }
}

#[async_trait]
impl<S: EntityStore + Clone + 'static> CommandHandler<AddOrderNote> for OrderHandlers<S> {
    async fn handle(
        &self,
        session: &UserSession,
        command: AddOrderNote,
    ) -> Result<Outcome, BoxError> {
        let content = command.content;
        Ok(self
            .modify_as(session, command.order_id, move |order| order.add_note(content))
            .await?)
    }
}

macro_rules! status_handler {
    ($command:ty, $method:ident) => {
        #[async_trait]
        impl<S: EntityStore + Clone + 'static> CommandHandler<$command> for OrderHandlers<S> {
            async fn handle(
                &self,
                session: &UserSession,
                command: $command,
            ) -> Result<Outcome, BoxError> {
                let at = self.clock.now();
                Ok(self
                    .modify_as(session, command.order_id, move |order| order.$method(at))
                    .await?)
            }
        }
    };
}

status_handler!(PrepareOrder, prepare);
status_handler!(MarkOrderPaid, mark_paid);
status_handler!(ShipOrder, ship);
status_handler!(ClearOrder, clear);
status_handler!(CancelOrder, cancel);

#[async_trait]
impl<S: EntityStore + Clone + 'static> QueryHandler<GetOrder> for OrderHandlers<S> {
    async fn handle(&self, session: &UserSession, query: GetOrder) -> Result<Outcome<Order>, BoxError> {
        let mut uow = self.uow(session);
        let order = uow
            .set::<Order>()
            .find(query.order_id)
            .await
            .map_err(DomainError::from)?;

        Ok(match order {
            Some(order) => Outcome::ok_with(order),
            None => Outcome::fail(ORDER_NOT_FOUND),
        })
    }
}

#[async_trait]
impl<S: EntityStore + Clone + 'static> QueryHandler<ListOrders> for OrderHandlers<S> {
    async fn handle(
        &self,
        session: &UserSession,
        query: ListOrders,
    ) -> Result<Outcome<PagedResult<OrderSummary>>, BoxError> {
        let mut uow = self.uow(session);
        let page = uow
            .set::<Order>()
            .list(query.page)
            .await
            .map_err(DomainError::from)?;
        Ok(Outcome::ok_with(page.map(|order| OrderSummary::from(&order))))
    }
}
