//! Prometheus metrics registry (§6's `/metrics` endpoint), following the
//! teacher's `Metrics` struct + `render()` shape (`src/metrics.rs`): one
//! process-wide `Registry`, exposed as the only global mutable singleton
//! this core touches (§9).

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub messages_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let messages_total = IntCounterVec::new(
            Opts::new("sms_messages_total", "Total messages by outcome and lane"),
            &["outcome", "lane"],
        )
        .expect("metric");

        registry
            .register(Box::new(messages_total.clone()))
            .expect("register messages_total");

        Self { registry, messages_total }
    }

    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf).map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn metrics_handler(State(metrics): State<Metrics>) -> Response {
    match metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics encode failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
