//! Dispatch and routing error types.

use thiserror::Error;

use crate::handler::BoxError;

/// Fatal dispatch failures.
///
/// These signal configuration or programming errors, or infrastructure
/// failures inside a handler. They are never business-rule outcomes.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the request type.
    #[error("No handler registered for {request}")]
    MissingHandler { request: &'static str },

    /// More than one handler was registered for the request type.
    #[error("More than one handler registered for {request}")]
    DuplicateHandler { request: &'static str },

    /// The handler returned a fatal error.
    #[error("Handler for {request} failed: {source}")]
    Handler {
        request: &'static str,
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// Returns the handler's error as `E`, if it is one.
    pub fn handler_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            DispatchError::Handler { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Failures while routing a JSON request.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The input is not a request envelope.
    #[error("Malformed request: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// No route is registered under the envelope's type name.
    #[error("Unknown request type '{0}'")]
    UnknownRequest(String),

    /// The payload does not bind to the request type.
    #[error("Invalid payload for {request}: {source}")]
    InvalidPayload {
        request: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Two routes were registered under the same name.
    #[error("Duplicate route for {0}")]
    DuplicateRoute(&'static str),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A query result could not be serialized.
    #[error("Failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}
