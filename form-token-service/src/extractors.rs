use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue};
use common_form_token::{TenantResolver, ValidationError};
use common_http_errors::ApiError;
use tracing::Span;
use uuid::Uuid;

use crate::app::TenantSettings;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const TRACE_HEADER: &str = "x-trace-id";
pub const FORM_TOKEN_HEADER: &str = "x-form-token";

/// Tenant and trace identifiers for the current request. The tenant comes
/// from `X-Tenant-ID`, falling back to the configured single-tenant value.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant_id: Option<String>,
    pub trace_id: Option<Uuid>,
}

impl TenantResolver for RequestContext {
    fn current(&self) -> Option<String> {
        self.tenant_id.clone()
    }
}

fn tenant_from_headers(headers: &HeaderMap) -> Result<Option<String>, ()> {
    match headers.get(TENANT_HEADER) {
        Some(raw) => {
            let value = raw.to_str().map_err(|_| ())?.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
        None => Ok(None),
    }
}

fn trace_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(TRACE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    Arc<TenantSettings>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = Arc::<TenantSettings>::from_ref(state);
        let trace_id = trace_id_from_headers(&parts.headers).or_else(|| Some(Uuid::new_v4()));

        let tenant_id = tenant_from_headers(&parts.headers)
            .map_err(|_| ApiError::BadRequest {
                code: "invalid_tenant_id",
                trace_id,
                message: Some("Invalid X-Tenant-ID header".into()),
            })?
            .or_else(|| settings.fallback_tenant.clone());

        if let Some(tenant) = tenant_id.as_deref() {
            Span::current().record("tenant_id", tracing::field::display(tenant));
        }
        if let Some(tid) = trace_id.as_ref() {
            Span::current().record("trace_id", tracing::field::display(tid));
        }

        Ok(Self {
            tenant_id,
            trace_id,
        })
    }
}

/// Raw token presented by a public form page, read from `X-Form-Token` or an
/// `Authorization: Bearer` header. Not verified by extraction.
#[derive(Debug, Clone)]
pub struct PresentedToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for PresentedToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let token = match headers.get(FORM_TOKEN_HEADER) {
            Some(value) => parse_plain(value),
            None => headers.get(AUTHORIZATION).and_then(parse_bearer),
        };
        token.map(PresentedToken).ok_or_else(|| {
            let missing = ValidationError::TokenMissing;
            ApiError::validation(missing.field(), missing.to_string(), trace_id_from_headers(headers))
        })
    }
}

fn parse_plain(value: &HeaderValue) -> Option<String> {
    let token = value.to_str().ok()?.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

fn parse_bearer(value: &HeaderValue) -> Option<String> {
    let raw = value.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_owned())
}
