//! Dispatcher and JSON router behaviour through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{EntityId, Outcome, UserSession};
use cqrs::{
    BoxError, Command, CommandHandler, DispatchError, Dispatcher, JsonRouter, Query, QueryHandler,
    RequestEnvelope, RouteError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Deserialize)]
struct Deposit {
    amount: i64,
}

impl Command for Deposit {
    const NAME: &'static str = "Deposit";

    fn validate(&self) -> Outcome {
        if self.amount == 0 {
            return Outcome::fail("Amount must not be zero.");
        }
        Outcome::ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Balance;

impl Query for Balance {
    const NAME: &'static str = "Balance";
    type Output = BalanceView;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct BalanceView {
    total: i64,
    last_user: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("ledger is closed")]
struct LedgerClosed;

#[derive(Clone, Default)]
struct Ledger {
    total: Arc<Mutex<i64>>,
    last_user: Arc<Mutex<Option<String>>>,
    calls: Arc<AtomicUsize>,
    closed: bool,
}

#[async_trait]
impl CommandHandler<Deposit> for Ledger {
    async fn handle(&self, session: &UserSession, command: Deposit) -> Result<Outcome, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.closed {
            return Err(Box::new(LedgerClosed));
        }

        let mut total = self.total.lock().await;
        if *total + command.amount < 0 {
            return Ok(Outcome::fail("Insufficient funds."));
        }
        *total += command.amount;
        *self.last_user.lock().await = session.user_name.clone();
        Ok(Outcome::ok())
    }
}

#[async_trait]
impl QueryHandler<Balance> for Ledger {
    async fn handle(
        &self,
        _session: &UserSession,
        _query: Balance,
    ) -> Result<Outcome<BalanceView>, BoxError> {
        Ok(Outcome::ok_with(BalanceView {
            total: *self.total.lock().await,
            last_user: self.last_user.lock().await.clone(),
        }))
    }
}

fn dispatcher(ledger: &Ledger) -> Dispatcher {
    Dispatcher::builder()
        .command::<Deposit, _>(ledger.clone())
        .query::<Balance, _>(ledger.clone())
        .build()
        .unwrap()
}

mod dispatcher {
    use super::*;

    #[tokio::test]
    async fn send_runs_the_registered_handler() {
        let ledger = Ledger::default();
        let dispatcher = dispatcher(&ledger);

        let outcome = dispatcher.send(Deposit { amount: 40 }).await.unwrap();
        assert!(outcome.is_ok());
        assert!(outcome.errors().is_empty());

        let balance = dispatcher.query(Balance).await.unwrap();
        assert_eq!(balance.value().map(|b| b.total), Some(40));
    }

    #[tokio::test]
    async fn business_failure_is_an_outcome() {
        let ledger = Ledger::default();
        let dispatcher = dispatcher(&ledger);

        let outcome = dispatcher.send(Deposit { amount: -5 }).await.unwrap();
        assert!(outcome.is_fail());
        assert_eq!(outcome.errors(), ["Insufficient funds."]);
    }

    #[tokio::test]
    async fn failed_validation_skips_the_handler() {
        let ledger = Ledger::default();
        let dispatcher = dispatcher(&ledger);

        let outcome = dispatcher.send(Deposit { amount: 0 }).await.unwrap();
        assert_eq!(outcome.errors(), ["Amount must not be zero."]);
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn session_reaches_the_handler() {
        let ledger = Ledger::default();
        let dispatcher = dispatcher(&ledger);
        let session = UserSession::for_user(EntityId::new(), "carol");

        dispatcher
            .send_as(&session, Deposit { amount: 1 })
            .await
            .unwrap();

        let view = dispatcher.query_as(&session, Balance).await.unwrap();
        assert_eq!(view.value().and_then(|v| v.last_user.as_deref()), Some("carol"));
    }

    #[tokio::test]
    async fn unregistered_request_is_fatal() {
        let ledger = Ledger::default();
        let dispatcher = Dispatcher::builder()
            .command::<Deposit, _>(ledger)
            .build()
            .unwrap();

        let err = dispatcher.query(Balance).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MissingHandler { request: "Balance" }
        ));
    }

    #[test]
    fn second_registration_is_fatal_at_build() {
        let ledger = Ledger::default();
        let err = Dispatcher::builder()
            .query::<Balance, _>(ledger.clone())
            .command::<Deposit, _>(ledger.clone())
            .query::<Balance, _>(ledger)
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::DuplicateHandler { request: "Balance" }
        ));
    }

    #[tokio::test]
    async fn handler_errors_are_fatal_and_inspectable() {
        let ledger = Ledger {
            closed: true,
            ..Ledger::default()
        };
        let dispatcher = dispatcher(&ledger);

        let err = dispatcher.send(Deposit { amount: 3 }).await.unwrap_err();
        assert!(err.handler_error::<LedgerClosed>().is_some());
        assert_eq!(err.to_string(), "Handler for Deposit failed: ledger is closed");
    }
}

mod json_router {
    use super::*;

    fn router(ledger: &Ledger) -> JsonRouter {
        JsonRouter::builder(dispatcher(ledger))
            .command::<Deposit>()
            .query::<Balance>()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn routes_by_type_name() {
        let ledger = Ledger::default();
        let router = router(&ledger);

        let reply = router
            .route_json(r#"{"type":"Deposit","payload":{"amount":12},"session":{"user_name":"dan"}}"#)
            .await
            .unwrap();
        assert!(reply.ok);
        assert!(reply.value.is_none());

        let reply = router
            .route(RequestEnvelope::new("Balance", serde_json::Value::Null))
            .await
            .unwrap();
        assert_eq!(reply.value, Some(json!({"total": 12, "last_user": "dan"})));
    }

    #[tokio::test]
    async fn failures_carry_messages() {
        let ledger = Ledger::default();
        let reply = router(&ledger)
            .route(RequestEnvelope::new("Deposit", json!({"amount": 0})))
            .await
            .unwrap();

        assert!(!reply.ok);
        assert_eq!(reply.errors, vec!["Amount must not be zero.".to_string()]);
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let ledger = Ledger::default();
        let err = router(&ledger)
            .route(RequestEnvelope::new("Withdraw", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::UnknownRequest(name) if name == "Withdraw"));
    }

    #[tokio::test]
    async fn payload_must_bind() {
        let ledger = Ledger::default();
        let err = router(&ledger)
            .route(RequestEnvelope::new("Deposit", json!({"amount": "lots"})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RouteError::InvalidPayload {
                request: "Deposit",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_input_is_rejected() {
        let ledger = Ledger::default();
        let err = router(&ledger).route_json("not json").await.unwrap_err();
        assert!(matches!(err, RouteError::MalformedEnvelope(_)));
    }

    #[test]
    fn duplicate_route_names_fail_build() {
        let ledger = Ledger::default();
        let result = JsonRouter::builder(dispatcher(&ledger))
            .command::<Deposit>()
            .command::<Deposit>()
            .build();
        assert!(matches!(result, Err(RouteError::DuplicateRoute("Deposit"))));
    }
}
