//! Catalog command and query handlers.

use async_trait::async_trait;
use common::{Outcome, PagedResult, SharedClock, UserSession};
use cqrs::{BoxError, CommandHandler, QueryHandler};
use store::{EntityStore, StoreError, UnitOfWork};

use super::{CreateProduct, GetProduct, ListProducts, Product, ProductPrice, RemoveProduct};
use crate::error::DomainError;
use crate::money::Money;

pub const PRODUCT_NOT_FOUND: &str = "Product not found.";
pub const PRODUCT_ALREADY_EXISTS: &str = "Product already exists.";

/// Handles every catalog request.
#[derive(Clone)]
pub struct CatalogHandlers<S> {
    store: S,
    clock: SharedClock,
}

impl<S: EntityStore + Clone + 'static> CatalogHandlers<S> {
    pub fn new(store: S, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    fn uow(&self, session: &UserSession) -> UnitOfWork<S> {
        UnitOfWork::new(self.store.clone(), session.clone(), self.clock.clone())
    }

    #[tracing::instrument(skip(self, session))]
    async fn create_product(
        &self,
        session: &UserSession,
        command: CreateProduct,
    ) -> Result<Outcome, DomainError> {
        let mut uow = self.uow(session);
        if uow.set::<Product>().find(command.product_id).await?.is_some() {
            return Ok(Outcome::fail(PRODUCT_ALREADY_EXISTS));
        }

        let prices = command
            .prices
            .iter()
            .map(|p| ProductPrice::new(p.price_type_id, Money::from_cents(p.price)))
            .collect();

        let product = match Product::create(command.product_id, command.title, prices) {
            Outcome::Ok(product) => product,
            Outcome::Fail(failure) => return Ok(Outcome::Fail(failure)),
        };

        uow.set::<Product>().add(&product)?;
        match uow.save_changes().await {
            Ok(_) => {}
            // Another request inserted the same id after our lookup
            Err(StoreError::DuplicateKey { .. }) => {
                tracing::info!(product_id = %command.product_id, "product created concurrently");
                return Ok(Outcome::fail(PRODUCT_ALREADY_EXISTS));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(product_id = %command.product_id, "product created");
        Ok(Outcome::ok())
    }

    #[tracing::instrument(skip(self, session))]
    async fn remove_product(
        &self,
        session: &UserSession,
        command: RemoveProduct,
    ) -> Result<Outcome, DomainError> {
        let mut uow = self.uow(session);
        if uow.set::<Product>().find(command.product_id).await?.is_none() {
            return Ok(Outcome::fail(PRODUCT_NOT_FOUND));
        }

        uow.set::<Product>().remove(command.product_id)?;
        uow.save_changes().await?;

        tracing::info!(product_id = %command.product_id, "product removed");
        Ok(Outcome::ok())
    }
}

#[async_trait]
impl<S: EntityStore + Clone + 'static> CommandHandler<CreateProduct> for CatalogHandlers<S> {
    async fn handle(
        &self,
        session: &UserSession,
        command: CreateProduct,
    ) -> Result<Outcome, BoxError> {
        Ok(self.create_product(session, command).await?)
    }
}

#[async_trait]
impl<S: EntityStore + Clone + 'static> CommandHandler<RemoveProduct> for CatalogHandlers<S> {
    async fn handle(
        &self,
        session: &UserSession,
        command: RemoveProduct,
    ) -> Result<Outcome, BoxError> {
        Ok(self.remove_product(session, command).await?)
    }
}

#[async_trait]
impl<S: EntityStore + Clone + 'static> QueryHandler<GetProduct> for CatalogHandlers<S> {
    async fn handle(
        &self,
        session: &UserSession,
        query: GetProduct,
    ) -> Result<Outcome<Product>, BoxError> {
        let mut uow = self.uow(session);
        let product = uow
            .set::<Product>()
            .find(query.product_id)
            .await
            .map_err(DomainError::from)?;

        Ok(match product {
            Some(product) => Outcome::ok_with(product),
            None => Outcome::fail(PRODUCT_NOT_FOUND),
        })
    }
}

#[async_trait]
impl<S: EntityStore + Clone + 'static> QueryHandler<ListProducts> for CatalogHandlers<S> {
    async fn handle(
        &self,
        session: &UserSession,
        query: ListProducts,
    ) -> Result<Outcome<PagedResult<Product>>, BoxError> {
        let mut uow = self.uow(session);
        let page = uow
            .set::<Product>()
            .list(query.page)
            .await
            .map_err(DomainError::from)?;
        Ok(Outcome::ok_with(page))
    }
}
