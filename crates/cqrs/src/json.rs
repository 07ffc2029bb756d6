//! JSON request routing.
//!
//! Requests arrive as `{"type": "...", "payload": {...}, "session": {...}}`
//! and bind to the registered request type of that name by field name.

use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use common::{Failure, Outcome, UserSession};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::error::RouteError;
use crate::request::{Command, Query};

/// An incoming request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Registered request name, e.g. `"CreateOrder"`.
    #[serde(rename = "type")]
    pub request_type: String,

    #[serde(default)]
    pub payload: Value,

    #[serde(default)]
    pub session: UserSession,
}

impl RequestEnvelope {
    pub fn new(request_type: impl Into<String>, payload: Value) -> Self {
        Self {
            request_type: request_type.into(),
            payload,
            session: UserSession::default(),
        }
    }

    pub fn with_session(mut self, session: UserSession) -> Self {
        self.session = session;
        self
    }
}

/// The reply to a routed request.
///
/// `ok` mirrors the outcome; `errors` is empty when `ok` is true and `value`
/// is only present for successful queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ResponseEnvelope {
    pub fn success(value: Option<Value>) -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            value,
        }
    }

    pub fn failure(failure: Failure) -> Self {
        Self {
            ok: false,
            errors: failure.messages().to_vec(),
            value: None,
        }
    }

    /// Reply for a request that could not be handled at all.
    pub fn error(error: &RouteError) -> Self {
        Self {
            ok: false,
            errors: vec![error.to_string()],
            value: None,
        }
    }
}

#[async_trait]
trait Route: Send + Sync {
    async fn dispatch(
        &self,
        dispatcher: &Dispatcher,
        session: &UserSession,
        payload: Value,
    ) -> Result<ResponseEnvelope, RouteError>;
}

struct CommandRoute<C>(PhantomData<fn() -> C>);

#[async_trait]
impl<C> Route for CommandRoute<C>
where
    C: Command + DeserializeOwned,
{
    async fn dispatch(
        &self,
        dispatcher: &Dispatcher,
        session: &UserSession,
        payload: Value,
    ) -> Result<ResponseEnvelope, RouteError> {
        let command: C = serde_json::from_value(payload).map_err(|source| {
            RouteError::InvalidPayload {
                request: C::NAME,
                source,
            }
        })?;

        Ok(match dispatcher.send_as(session, command).await? {
            Outcome::Ok(()) => ResponseEnvelope::success(None),
            Outcome::Fail(failure) => ResponseEnvelope::failure(failure),
        })
    }
}

struct QueryRoute<Q>(PhantomData<fn() -> Q>);

#[async_trait]
impl<Q> Route for QueryRoute<Q>
where
    Q: Query + DeserializeOwned,
    Q::Output: Serialize,
{
    async fn dispatch(
        &self,
        dispatcher: &Dispatcher,
        session: &UserSession,
        payload: Value,
    ) -> Result<ResponseEnvelope, RouteError> {
        let query: Q = serde_json::from_value(payload).map_err(|source| {
            RouteError::InvalidPayload {
                request: Q::NAME,
                source,
            }
        })?;

        Ok(match dispatcher.query_as(session, query).await? {
            Outcome::Ok(value) => ResponseEnvelope::success(Some(serde_json::to_value(value)?)),
            Outcome::Fail(failure) => ResponseEnvelope::failure(failure),
        })
    }
}

/// Collects named routes.
pub struct JsonRouterBuilder {
    dispatcher: Dispatcher,
    routes: HashMap<&'static str, Box<dyn Route>>,
    duplicates: Vec<&'static str>,
}

impl JsonRouterBuilder {
    /// Exposes command `C` under `C::NAME`.
    pub fn command<C>(mut self) -> Self
    where
        C: Command + DeserializeOwned,
    {
        self.insert(C::NAME, Box::new(CommandRoute::<C>(PhantomData)));
        self
    }

    /// Exposes query `Q` under `Q::NAME`.
    pub fn query<Q>(mut self) -> Self
    where
        Q: Query + DeserializeOwned,
        Q::Output: Serialize,
    {
        self.insert(Q::NAME, Box::new(QueryRoute::<Q>(PhantomData)));
        self
    }

    fn insert(&mut self, name: &'static str, route: Box<dyn Route>) {
        if self.routes.contains_key(name) {
            self.duplicates.push(name);
            return;
        }
        self.routes.insert(name, route);
    }

    pub fn build(self) -> Result<JsonRouter, RouteError> {
        if let Some(name) = self.duplicates.first() {
            return Err(RouteError::DuplicateRoute(name));
        }
        Ok(JsonRouter {
            dispatcher: self.dispatcher,
            routes: self.routes,
        })
    }
}

/// Binds JSON envelopes to typed requests and dispatches them.
pub struct JsonRouter {
    dispatcher: Dispatcher,
    routes: HashMap<&'static str, Box<dyn Route>>,
}

impl JsonRouter {
    pub fn builder(dispatcher: Dispatcher) -> JsonRouterBuilder {
        JsonRouterBuilder {
            dispatcher,
            routes: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Registered request names, sorted.
    pub fn request_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.routes.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Routes one envelope.
    #[tracing::instrument(skip_all, fields(request = %envelope.request_type))]
    pub async fn route(&self, envelope: RequestEnvelope) -> Result<ResponseEnvelope, RouteError> {
        let route = self
            .routes
            .get(envelope.request_type.as_str())
            .ok_or_else(|| RouteError::UnknownRequest(envelope.request_type.clone()))?;

        route
            .dispatch(&self.dispatcher, &envelope.session, envelope.payload)
            .await
    }

    /// Parses and routes one JSON document.
    pub async fn route_json(&self, input: &str) -> Result<ResponseEnvelope, RouteError> {
        let envelope: RequestEnvelope =
            serde_json::from_str(input).map_err(RouteError::MalformedEnvelope)?;
        self.route(envelope).await
    }
}
