use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use common_form_token::{
    Claims, FormTokenError, IssueParams, Rejection, ValidationError, VerifyParams,
};
use common_http_errors::{ApiError, ApiResult};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::extractors::{PresentedToken, RequestContext};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IssueResponse {
    pub token: String,
    pub form: String,
    pub tenant_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub claims: Claims,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> ApiResult<Response> {
    state.metrics.render().map_err(|err| {
        error!(error = %err, "Unable to render metrics");
        ApiError::internal(err, None)
    })
}

pub async fn issue_token(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<IssueResponse>)> {
    issue(&state, &ctx, None, query, &body).map_err(|err| record_error(&state, err))
}

pub async fn issue_token_for_form(
    State(state): State<AppState>,
    Path(form): Path<String>,
    ctx: RequestContext,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<IssueResponse>)> {
    issue(&state, &ctx, Some(&form), query, &body).map_err(|err| record_error(&state, err))
}

pub async fn verify_token(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResult<Json<VerifyResponse>> {
    verify(&state, &ctx, query, &body).map_err(|err| record_error(&state, err))
}

/// Guard used by public form pages: the presented token must have been issued
/// for the form named in the path.
pub async fn form_session(
    State(state): State<AppState>,
    Path(form): Path<String>,
    ctx: RequestContext,
    PresentedToken(token): PresentedToken,
) -> ApiResult<Json<VerifyResponse>> {
    check_token(&state, &ctx, &token, Some(form.trim()))
        .map(|claims| Json(VerifyResponse { valid: true, claims }))
        .map_err(|err| record_error(&state, err))
}

fn issue(
    state: &AppState,
    ctx: &RequestContext,
    path_form: Option<&str>,
    query: HashMap<String, String>,
    body: &[u8],
) -> ApiResult<(StatusCode, Json<IssueResponse>)> {
    let body = parse_body(body, ctx.trace_id)?;
    let query = query_map(query);
    let params = IssueParams::from_sources(path_form, &query, &body)
        .map_err(|err| validation_error(err, ctx.trace_id))?;

    let issued = state
        .issuer
        .issue(params.form.as_deref(), params.ttl_minutes, ctx)
        .map_err(|err| issuance_error(err, ctx.trace_id))?;
    state.metrics.token_issued(params.form.is_none());

    info!(
        form = %issued.claims.form,
        tenant_id = issued.claims.tenant_id.as_deref().unwrap_or("-"),
        expires_at = %issued.expires_at,
        "Issued public form token"
    );

    let expires_in = issued.expires_in();
    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            token: issued.token,
            form: issued.claims.form,
            tenant_id: issued.claims.tenant_id,
            expires_at: issued.expires_at,
            expires_in,
        }),
    ))
}

fn verify(
    state: &AppState,
    ctx: &RequestContext,
    query: HashMap<String, String>,
    body: &[u8],
) -> ApiResult<Json<VerifyResponse>> {
    let body = parse_body(body, ctx.trace_id)?;
    let query = query_map(query);
    let params = VerifyParams::from_sources(&query, &body)
        .map_err(|err| validation_error(err, ctx.trace_id))?;
    let claims = check_token(state, ctx, &params.token, params.form.as_deref())?;
    Ok(Json(VerifyResponse {
        valid: true,
        claims,
    }))
}

fn check_token(
    state: &AppState,
    ctx: &RequestContext,
    token: &str,
    expected_form: Option<&str>,
) -> ApiResult<Claims> {
    match state.verifier.verify(token, expected_form, ctx) {
        Ok(claims) => {
            state.metrics.verification("valid");
            Ok(claims)
        }
        Err(reason) => {
            state.metrics.verification(reason.code());
            warn!(
                reason = reason.code(),
                tenant_id = ctx.tenant_id.as_deref().unwrap_or("-"),
                "Rejected public form token"
            );
            Err(rejection_error(reason, ctx.trace_id))
        }
    }
}

/// Empty bodies are allowed; anything else must be a JSON object.
fn parse_body(body: &[u8], trace_id: Option<Uuid>) -> ApiResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::BadRequest {
            code: "invalid_body",
            trace_id,
            message: Some("Request body must be a JSON object".into()),
        }),
        Err(err) => Err(ApiError::BadRequest {
            code: "invalid_json",
            trace_id,
            message: Some(format!("Malformed JSON body: {err}")),
        }),
    }
}

fn query_map(query: HashMap<String, String>) -> Map<String, Value> {
    query
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}

fn validation_error(err: ValidationError, trace_id: Option<Uuid>) -> ApiError {
    ApiError::validation(err.field(), err.to_string(), trace_id)
}

fn issuance_error(err: FormTokenError, trace_id: Option<Uuid>) -> ApiError {
    match err {
        FormTokenError::Validation(err) => validation_error(err, trace_id),
        other => {
            error!(error = %other, "Failed to issue public form token");
            ApiError::internal(other, trace_id)
        }
    }
}

fn rejection_error(reason: Rejection, trace_id: Option<Uuid>) -> ApiError {
    ApiError::invalid_token(format!("Invalid token: {reason}"), trace_id)
}

fn record_error(state: &AppState, err: ApiError) -> ApiError {
    state.metrics.http_error(err.code(), err.status());
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_empty_map() {
        assert!(parse_body(b"", None).expect("empty").is_empty());
        assert!(parse_body(b"  \n", None).expect("blank").is_empty());
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = parse_body(b"[1,2]", None).expect_err("reject");
        assert_eq!(err.code(), "invalid_body");
        let err = parse_body(b"{not json", None).expect_err("reject");
        assert_eq!(err.code(), "invalid_json");
    }

    #[test]
    fn rejection_message_names_reason() {
        let err = rejection_error(Rejection::Expired, None);
        assert_eq!(err.code(), "invalid_token");
        match err {
            ApiError::InvalidToken { message, .. } => {
                assert_eq!(message, "Invalid token: token has expired")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
