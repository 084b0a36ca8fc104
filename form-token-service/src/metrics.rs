use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub const SERVICE_NAME: &str = "form-token-service";

#[derive(Clone)]
pub struct FormTokenMetrics {
    registry: Registry,
    tokens_issued: IntCounterVec,
    verifications: IntCounterVec,
    http_errors: IntCounterVec,
}

impl FormTokenMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let tokens_issued = IntCounterVec::new(
            Opts::new(
                "form_tokens_issued_total",
                "Count of public form tokens issued, split by whether the default form was used",
            ),
            &["form_default"],
        )?;
        registry.register(Box::new(tokens_issued.clone()))?;

        let verifications = IntCounterVec::new(
            Opts::new(
                "form_token_verifications_total",
                "Count of public form token verifications grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(verifications.clone()))?;

        let http_errors = IntCounterVec::new(
            Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)",
            ),
            &["service", "code", "status"],
        )?;
        registry.register(Box::new(http_errors.clone()))?;

        Ok(Self {
            registry,
            tokens_issued,
            verifications,
            http_errors,
        })
    }

    pub fn token_issued(&self, used_default_form: bool) {
        let label = if used_default_form { "true" } else { "false" };
        self.tokens_issued.with_label_values(&[label]).inc();
    }

    /// `outcome` is `valid` or a rejection code.
    pub fn verification(&self, outcome: &str) {
        self.verifications.with_label_values(&[outcome]).inc();
    }

    pub fn http_error(&self, code: &str, status: StatusCode) {
        self.http_errors
            .with_label_values(&[SERVICE_NAME, code, status.as_str()])
            .inc();
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
