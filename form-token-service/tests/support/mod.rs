#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common_crypto::SigningSecret;
use common_form_token::{FixedClock, FormTokenConfig};
use form_token_service::{build_router, AppState, TenantSettings};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const NOW: i64 = 1_717_000_000;
pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_tenancy(TenantSettings::default())
    }

    pub fn with_tenancy(tenancy: TenantSettings) -> Self {
        let clock = Arc::new(FixedClock::at(NOW));
        let secret = SigningSecret::from_config(SECRET).expect("secret");
        let state = AppState::new(FormTokenConfig::new(secret), tenancy, clock.clone())
            .expect("state");
        Self {
            router: build_router(state),
            clock,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let resp = self.router.clone().oneshot(request).await.expect("response");
        let status = resp.status();
        let code = resp
            .headers()
            .get("X-Error-Code")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.into_body().collect().await.expect("body").to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, code, body)
    }
}

pub fn post_json(uri: &str, tenant: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(tenant) = tenant {
        builder = builder.header("X-Tenant-ID", tenant);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn post_empty(uri: &str, tenant: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(tenant) = tenant {
        builder = builder.header("X-Tenant-ID", tenant);
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn issue(app: &TestApp, form: Option<&str>, ttl: Option<i64>, tenant: Option<&str>) -> String {
    let mut body = serde_json::Map::new();
    if let Some(form) = form {
        body.insert("form".into(), Value::String(form.into()));
    }
    if let Some(ttl) = ttl {
        body.insert("ttl".into(), Value::from(ttl));
    }
    let (status, _, json) = app
        .send(post_json("/public-form-tokens", tenant, Value::Object(body)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "issue failed: {json}");
    json["token"].as_str().expect("token").to_string()
}
