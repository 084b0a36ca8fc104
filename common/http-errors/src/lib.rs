use std::collections::BTreeMap;

use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use uuid::Uuid;

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

/// Field name -> list of human-readable messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")] pub trace_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")] pub message: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    Validation { errors: FieldErrors, trace_id: Option<Uuid> },
    InvalidToken { trace_id: Option<Uuid>, message: String },
    NotFound { code: &'static str, trace_id: Option<Uuid> },
    Internal { trace_id: Option<Uuid>, message: Option<String> },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E, trace_id: Option<Uuid>) -> Self { Self::Internal { trace_id, message: Some(e.to_string()) } }
    pub fn bad_request(code: &'static str, trace_id: Option<Uuid>) -> Self { Self::BadRequest { code, trace_id, message: None } }
    pub fn invalid_token(message: impl Into<String>, trace_id: Option<Uuid>) -> Self { Self::InvalidToken { trace_id, message: message.into() } }

    /// Single-field validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>, trace_id: Option<Uuid>) -> Self {
        let mut errors = FieldErrors::new();
        errors.entry(field.into()).or_default().push(message.into());
        Self::Validation { errors, trace_id }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, also emitted as the `X-Error-Code` header.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { code, .. } | ApiError::NotFound { code, .. } => code,
            ApiError::Validation { .. } => "validation_failed",
            ApiError::InvalidToken { .. } => "invalid_token",
            ApiError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.code();
        let body = match self {
            ApiError::BadRequest { code, trace_id, message } =>
                ErrorBody { code: code.into(), errors: None, trace_id, message },
            ApiError::Validation { errors, trace_id } =>
                ErrorBody { code: error_code.into(), errors: Some(errors), trace_id, message: Some("The given data was invalid.".into()) },
            ApiError::InvalidToken { trace_id, message } =>
                ErrorBody { code: error_code.into(), errors: None, trace_id, message: Some(message) },
            ApiError::NotFound { code, trace_id } =>
                ErrorBody { code: code.into(), errors: None, trace_id, message: None },
            ApiError::Internal { trace_id, message } =>
                ErrorBody { code: error_code.into(), errors: None, trace_id, message },
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert(ERROR_CODE_HEADER, val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
