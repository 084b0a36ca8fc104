use common_crypto::CryptoError;
use thiserror::Error;

pub type FormTokenResult<T> = Result<T, FormTokenError>;

/// Failures while issuing a token.
#[derive(Debug, Error)]
pub enum FormTokenError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to sign token: {0}")]
    Signing(#[from] CryptoError),
    #[error("failed to encode claims: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("clock returned an unrepresentable timestamp: {0}")]
    Clock(i64),
    #[error("invalid form token configuration: {0}")]
    Config(String),
}

/// Field-level input errors, recoverable by resubmitting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The form may not be greater than 100 characters.")]
    FormTooLong { actual: usize },
    #[error("The form must be a string.")]
    FormNotString,
    #[error("The ttl must be between 1 and 1440.")]
    TtlOutOfRange { actual: i64 },
    #[error("The ttl must be an integer.")]
    TtlNotInteger,
    #[error("The token field is required.")]
    TokenMissing,
    #[error("The token must be a string.")]
    TokenNotString,
}

impl ValidationError {
    /// Request field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::FormTooLong { .. } | ValidationError::FormNotString => "form",
            ValidationError::TtlOutOfRange { .. } | ValidationError::TtlNotInteger => "ttl",
            ValidationError::TokenMissing | ValidationError::TokenNotString => "token",
        }
    }
}

/// Why a presented token was refused. Callers surface every variant as the
/// same "invalid token" outcome; only the message differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token does not belong to the current tenant")]
    TenantMismatch,
    #[error("token was issued for a different form")]
    FormMismatch,
}

impl Rejection {
    /// Low-cardinality label for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Malformed => "malformed",
            Rejection::BadSignature => "bad_signature",
            Rejection::Expired => "expired",
            Rejection::TenantMismatch => "tenant_mismatch",
            Rejection::FormMismatch => "form_mismatch",
        }
    }
}
