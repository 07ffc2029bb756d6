//! Type-keyed handler registry.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use common::{Outcome, UserSession};

use crate::error::DispatchError;
use crate::handler::{CommandHandler, QueryHandler};
use crate::request::{Command, Query};

struct Registration {
    name: &'static str,
    // Holds an `Arc<dyn CommandHandler<C>>` or `Arc<dyn QueryHandler<Q>>`
    handler: Box<dyn Any + Send + Sync>,
}

/// Collects handler registrations before the dispatcher is built.
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: HashMap<TypeId, Registration>,
    duplicates: Vec<&'static str>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for command `C`.
    pub fn command<C, H>(mut self, handler: H) -> Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = Arc::new(handler);
        self.register(TypeId::of::<C>(), C::NAME, Box::new(handler));
        self
    }

    /// Registers the handler for query `Q`.
    pub fn query<Q, H>(mut self, handler: H) -> Self
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        let handler: Arc<dyn QueryHandler<Q>> = Arc::new(handler);
        self.register(TypeId::of::<Q>(), Q::NAME, Box::new(handler));
        self
    }

    fn register(&mut self, key: TypeId, name: &'static str, handler: Box<dyn Any + Send + Sync>) {
        if self.handlers.contains_key(&key) {
            self.duplicates.push(name);
            return;
        }
        self.handlers.insert(key, Registration { name, handler });
    }

    /// Builds the dispatcher.
    ///
    /// Fails with `DuplicateHandler` naming the first request type that was
    /// registered more than once.
    pub fn build(self) -> Result<Dispatcher, DispatchError> {
        if let Some(request) = self.duplicates.first() {
            return Err(DispatchError::DuplicateHandler { request });
        }

        tracing::debug!(handlers = self.handlers.len(), "dispatcher built");
        Ok(Dispatcher {
            handlers: Arc::new(self.handlers),
        })
    }
}

/// Routes each request to its single registered handler.
///
/// Cloning is cheap; clones share the registry.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<HashMap<TypeId, Registration>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.values().map(|r| r.name).collect();
        names.sort_unstable();
        f.debug_struct("Dispatcher").field("handlers", &names).finish()
    }
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Number of registered request types.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if a handler is registered for request type `R`.
    pub fn handles<R: 'static>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    /// Sends a command on behalf of an anonymous caller.
    pub async fn send<C: Command>(&self, command: C) -> Result<Outcome, DispatchError> {
        self.send_as(&UserSession::anonymous(), command).await
    }

    /// Runs a query on behalf of an anonymous caller.
    pub async fn query<Q: Query>(&self, query: Q) -> Result<Outcome<Q::Output>, DispatchError> {
        self.query_as(&UserSession::anonymous(), query).await
    }

    /// Sends a command on behalf of `session`.
    ///
    /// The command's own validation runs first; a failed validation is
    /// returned without invoking the handler.
    #[tracing::instrument(skip_all, fields(request = C::NAME, user = session.user_name.as_deref()))]
    pub async fn send_as<C: Command>(
        &self,
        session: &UserSession,
        command: C,
    ) -> Result<Outcome, DispatchError> {
        let handler = self.resolve::<C, Arc<dyn CommandHandler<C>>>(C::NAME)?;
        let started = Instant::now();

        let result = match command.validate() {
            Outcome::Fail(failure) => Ok(Outcome::Fail(failure)),
            Outcome::Ok(()) => handler
                .handle(session, command)
                .await
                .map_err(|source| DispatchError::Handler {
                    request: C::NAME,
                    source,
                }),
        };

        record(C::NAME, result.as_ref().map(Outcome::is_ok), started);
        result
    }

    /// Runs a query on behalf of `session`.
    #[tracing::instrument(skip_all, fields(request = Q::NAME, user = session.user_name.as_deref()))]
    pub async fn query_as<Q: Query>(
        &self,
        session: &UserSession,
        query: Q,
    ) -> Result<Outcome<Q::Output>, DispatchError> {
        let handler = self.resolve::<Q, Arc<dyn QueryHandler<Q>>>(Q::NAME)?;
        let started = Instant::now();

        let result = match query.validate() {
            Outcome::Fail(failure) => Ok(Outcome::Fail(failure)),
            Outcome::Ok(()) => handler
                .handle(session, query)
                .await
                .map_err(|source| DispatchError::Handler {
                    request: Q::NAME,
                    source,
                }),
        };

        record(Q::NAME, result.as_ref().map(Outcome::is_ok), started);
        result
    }

    fn resolve<R: 'static, H: Clone + 'static>(
        &self,
        request: &'static str,
    ) -> Result<H, DispatchError> {
        self.handlers
            .get(&TypeId::of::<R>())
            .and_then(|registration| registration.handler.downcast_ref::<H>())
            .cloned()
            .ok_or(DispatchError::MissingHandler { request })
    }
}

fn record(request: &'static str, result: Result<bool, &DispatchError>, started: Instant) {
    let outcome = match result {
        Ok(true) => "ok",
        Ok(false) => "fail",
        Err(_) => "error",
    };

    match result {
        Ok(true) => tracing::debug!(outcome, "request handled"),
        Ok(false) => tracing::info!(outcome, "request rejected"),
        Err(e) => tracing::error!(error = %e, "request failed"),
    }

    metrics::counter!("cqrs_dispatch_total", "request" => request, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("cqrs_dispatch_duration_seconds", "request" => request)
        .record(started.elapsed().as_secs_f64());
}
