use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub const SERVICE_NAME: &str = "horology-service";

#[derive(Clone)]
pub struct ServiceMetrics {
    pub registry: Registry,
    pub http_errors_total: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let http_errors_total = IntCounterVec::new(
            Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)",
            ),
            &["service", "code", "status"],
        )?;
        registry.register(Box::new(http_errors_total.clone()))?;
        Ok(Self {
            registry,
            http_errors_total,
        })
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Counts every error response, labelled by its `X-Error-Code` header.
pub async fn http_error_metrics(
    State(metrics): State<Arc<ServiceMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp
            .headers()
            .get("X-Error-Code")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        metrics
            .http_errors_total
            .with_label_values(&[SERVICE_NAME, code, status.as_str()])
            .inc();
    }
    resp
}

pub async fn metrics_endpoint(State(metrics): State<Arc<ServiceMetrics>>) -> Response {
    match metrics.render() {
        Ok(body) => {
            let mut resp = body.into_response();
            resp.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            resp
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {err}"),
        )
            .into_response(),
    }
}
