use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::FromRef;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::routing::{get, post};
use axum::Router;
use common_form_token::{Clock, FormTokenConfig, FormTokenIssuer, FormTokenVerifier, SystemClock};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::ServiceConfig;
use crate::extractors::{FORM_TOKEN_HEADER, TENANT_HEADER, TRACE_HEADER};
use crate::handlers::{
    form_session, health, issue_token, issue_token_for_form, metrics_endpoint, verify_token,
};
use crate::metrics::FormTokenMetrics;

/// How a request's tenant is determined when the header is absent.
#[derive(Debug, Clone, Default)]
pub struct TenantSettings {
    pub fallback_tenant: Option<String>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<FormTokenIssuer>,
    pub verifier: Arc<FormTokenVerifier>,
    pub tenancy: Arc<TenantSettings>,
    pub metrics: Arc<FormTokenMetrics>,
}

impl AppState {
    pub fn new(
        form_config: FormTokenConfig,
        tenancy: TenantSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let issuer = FormTokenIssuer::new(form_config.clone())
            .context("Failed to build form token issuer")?
            .with_clock(clock.clone());
        let verifier = FormTokenVerifier::new(form_config)
            .context("Failed to build form token verifier")?
            .with_clock(clock);
        let metrics = FormTokenMetrics::new().context("Failed to register metrics")?;
        Ok(Self {
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
            tenancy: Arc::new(tenancy),
            metrics: Arc::new(metrics),
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let tenancy = TenantSettings {
            fallback_tenant: config.fallback_tenant.clone(),
        };
        Self::new(config.form_token_config(), tenancy, Arc::new(SystemClock))
    }
}

impl FromRef<AppState> for Arc<FormTokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

impl FromRef<AppState> for Arc<TenantSettings> {
    fn from_ref(state: &AppState) -> Self {
        state.tenancy.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/public-form-tokens", post(issue_token))
        .route("/public-form-tokens/verify", post(verify_token))
        .route("/public-form-tokens/:form", post(issue_token_for_form))
        .route("/public-forms/:form/session", get(form_session))
        .with_state(state)
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(TENANT_HEADER),
            HeaderName::from_static(TRACE_HEADER),
            HeaderName::from_static(FORM_TOKEN_HEADER),
        ])
}
