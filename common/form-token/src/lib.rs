//! Stateless, HMAC-signed, tenant-scoped tokens that let an anonymous client
//! fill in a public form without a session.
//!
//! A token is `base64url(claims_json) "." base64url(hmac_sha256(secret, payload_segment))`.
//! Nothing is stored server side; expiry is the only end of life.

pub mod claims;
pub mod config;
pub mod error;
pub mod issuer;
pub mod provider;
pub mod request;
pub mod token;
pub mod verifier;

pub use claims::Claims;
pub use config::{
    FormTokenConfig, DEFAULT_FORM, DEFAULT_TTL_MINUTES, MAX_FORM_LENGTH, MAX_TTL_MINUTES,
    MIN_TTL_MINUTES,
};
pub use error::{FormTokenError, FormTokenResult, Rejection, ValidationError};
pub use issuer::{FormTokenIssuer, IssuedToken};
pub use provider::{Clock, FixedClock, SecretProvider, StaticTenant, SystemClock, TenantResolver};
pub use request::{IssueParams, VerifyParams};
pub use token::FormToken;
pub use verifier::FormTokenVerifier;
