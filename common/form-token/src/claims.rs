use chrono::{DateTime, TimeZone, Utc};
use common_crypto::{b64url_decode, b64url_encode};
use serde::{Deserialize, Serialize};

use crate::error::{FormTokenResult, Rejection};

/// The signed payload of a form token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub form: String,
    pub tenant_id: Option<String>,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    pub nonce: String,
}

impl Claims {
    /// Tokens stay valid through the expiry second itself.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expires_at, 0).single()
    }

    pub fn issued_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.issued_at, 0).single()
    }

    /// Serialize once and base64url the bytes; the result is both the token's
    /// payload segment and the HMAC message.
    pub(crate) fn to_segment(&self) -> FormTokenResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(b64url_encode(json))
    }

    pub(crate) fn from_segment(segment: &str) -> Result<Self, Rejection> {
        let bytes = b64url_decode(segment).map_err(|_| Rejection::Malformed)?;
        serde_json::from_slice(&bytes).map_err(|_| Rejection::Malformed)
    }
}
