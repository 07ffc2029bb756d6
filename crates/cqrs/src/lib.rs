//! Command/query dispatch.
//!
//! A [`Dispatcher`] maps each request type to exactly one handler. The
//! registry is built once at startup; [`DispatcherBuilder::build`] rejects a
//! request type registered twice, and dispatching an unregistered type is a
//! [`DispatchError::MissingHandler`]. Business-rule failures travel back as
//! [`Outcome::Fail`](common::Outcome), never as errors.
//!
//! [`JsonRouter`] sits in front of the dispatcher and binds JSON request
//! envelopes to typed requests by name.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod json;
pub mod request;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, RouteError};
pub use handler::{BoxError, CommandHandler, QueryHandler};
pub use json::{JsonRouter, JsonRouterBuilder, RequestEnvelope, ResponseEnvelope};
pub use request::{Command, Query};
