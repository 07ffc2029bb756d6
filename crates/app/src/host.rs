//! The JSON-lines request loop.
//!
//! Each input line is one [`RequestEnvelope`]; each non-blank line gets
//! exactly one [`ResponseEnvelope`] line back, in input order. Requests that
//! cannot be routed at all are answered with `ok: false` and the loop keeps
//! going.

use std::future::Future;

use cqrs::{JsonRouter, RequestEnvelope, ResponseEnvelope, RouteError};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::AppError;

/// Built-in request answered by the host itself.
pub const HEALTH_REQUEST: &str = "Health";

/// Built-in request returning the Prometheus text exposition.
pub const METRICS_REQUEST: &str = "Metrics";

/// Counts of what one [`Host::serve`] run handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub received: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl ServeStats {
    fn record(&mut self, response: &ResponseEnvelope) {
        self.received += 1;
        if response.ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Answers request envelopes through a [`JsonRouter`].
pub struct Host {
    router: JsonRouter,
    metrics: Option<PrometheusHandle>,
}

impl Host {
    pub fn new(router: JsonRouter) -> Self {
        Self {
            router,
            metrics: None,
        }
    }

    /// Enables the `Metrics` request.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn router(&self) -> &JsonRouter {
        &self.router
    }

    /// Answers one input line. Blank lines are skipped.
    pub async fn handle_line(&self, line: &str) -> Option<ResponseEnvelope> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<RequestEnvelope>(line) {
            Ok(envelope) => Some(self.handle(envelope).await),
            Err(source) => Some(self.reject("<malformed>", RouteError::MalformedEnvelope(source))),
        }
    }

    /// Answers one envelope.
    pub async fn handle(&self, envelope: RequestEnvelope) -> ResponseEnvelope {
        let request_type = envelope.request_type.clone();

        let response = match request_type.as_str() {
            HEALTH_REQUEST => ResponseEnvelope::success(Some(json!({
                "status": "ok",
                "request_types": self.router.request_types(),
            }))),
            METRICS_REQUEST => match &self.metrics {
                Some(handle) => ResponseEnvelope::success(Some(json!({ "text": handle.render() }))),
                None => ResponseEnvelope {
                    ok: false,
                    errors: vec!["Metrics are not enabled.".to_string()],
                    value: None,
                },
            },
            _ => match self.router.route(envelope).await {
                Ok(response) => response,
                Err(err) => return self.reject(&request_type, err),
            },
        };

        let status = if response.ok { "ok" } else { "fail" };
        metrics::counter!("app_requests_total", "request" => request_type, "status" => status)
            .increment(1);
        response
    }

    fn reject(&self, request_type: &str, err: RouteError) -> ResponseEnvelope {
        match &err {
            RouteError::Dispatch(_) | RouteError::Serialization(_) => {
                tracing::error!(request = %request_type, error = %err, "request failed");
            }
            _ => {
                tracing::warn!(request = %request_type, error = %err, "request rejected");
            }
        }
        metrics::counter!(
            "app_requests_total",
            "request" => request_type.to_string(),
            "status" => "error"
        )
        .increment(1);
        ResponseEnvelope::error(&err)
    }

    /// Reads request lines from `reader` and writes one response line per
    /// request to `writer` until the input ends or `shutdown` completes.
    pub async fn serve<R, W, F>(
        &self,
        reader: R,
        mut writer: W,
        shutdown: F,
    ) -> Result<ServeStats, AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        let mut lines = reader.lines();
        let mut stats = ServeStats::default();
        tokio::pin!(shutdown);

        loop {
            let line = tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, stopping request loop");
                    break;
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                tracing::info!("input closed");
                break;
            };

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            stats.record(&response);

            let mut output = serde_json::to_vec(&response)?;
            output.push(b'\n');
            writer.write_all(&output).await?;
            writer.flush().await?;
        }

        Ok(stats)
    }
}
