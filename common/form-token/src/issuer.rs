use std::sync::Arc;

use chrono::{DateTime, Utc};
use common_crypto::sign_b64url;
use tracing::debug;
use uuid::Uuid;

use crate::claims::Claims;
use crate::config::{FormTokenConfig, MAX_FORM_LENGTH, MAX_TTL_MINUTES, MIN_TTL_MINUTES};
use crate::error::{FormTokenError, FormTokenResult, ValidationError};
use crate::provider::{Clock, SystemClock, TenantResolver};

/// Result of a successful issuance.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Seconds between issuance and expiry.
    pub fn expires_in(&self) -> i64 {
        self.claims.expires_at - self.claims.issued_at
    }
}

#[derive(Clone)]
pub struct FormTokenIssuer {
    config: FormTokenConfig,
    clock: Arc<dyn Clock>,
}

impl FormTokenIssuer {
    pub fn new(config: FormTokenConfig) -> FormTokenResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &FormTokenConfig {
        &self.config
    }

    /// Issue a token for the tenant the resolver reports, at the current time.
    pub fn issue(
        &self,
        form: Option<&str>,
        ttl_minutes: Option<i64>,
        tenant: &dyn TenantResolver,
    ) -> FormTokenResult<IssuedToken> {
        self.issue_at(form, ttl_minutes, tenant.current(), self.clock.now())
    }

    /// Pure issuance: validates input, builds the claims and signs them.
    pub fn issue_at(
        &self,
        form: Option<&str>,
        ttl_minutes: Option<i64>,
        tenant_id: Option<String>,
        now: i64,
    ) -> FormTokenResult<IssuedToken> {
        let form = match form {
            Some(form) => {
                validate_form(form)?;
                form.to_string()
            }
            None => self.config.default_form.clone(),
        };
        let ttl = match ttl_minutes {
            Some(ttl) => validate_ttl(ttl)?,
            None => self.config.default_ttl_minutes,
        };

        let expires_at = now
            .checked_add(ttl * 60)
            .ok_or(FormTokenError::Clock(now))?;
        let claims = Claims {
            form,
            tenant_id,
            issued_at: now,
            expires_at,
            nonce: Uuid::new_v4().to_string(),
        };
        let expires_at_utc = claims
            .expires_at_utc()
            .ok_or(FormTokenError::Clock(expires_at))?;

        let payload = claims.to_segment()?;
        let signature = sign_b64url(self.config.secret.current(), payload.as_bytes())?;
        let token = format!("{payload}.{signature}");

        debug!(
            form = %claims.form,
            tenant_id = claims.tenant_id.as_deref().unwrap_or("-"),
            ttl_minutes = ttl,
            "issued public form token"
        );

        Ok(IssuedToken {
            token,
            claims,
            expires_at: expires_at_utc,
        })
    }
}

pub fn validate_form(form: &str) -> Result<(), ValidationError> {
    let actual = form.chars().count();
    if actual > MAX_FORM_LENGTH {
        return Err(ValidationError::FormTooLong { actual });
    }
    Ok(())
}

pub fn validate_ttl(ttl_minutes: i64) -> Result<i64, ValidationError> {
    if (MIN_TTL_MINUTES..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
        Ok(ttl_minutes)
    } else {
        Err(ValidationError::TtlOutOfRange {
            actual: ttl_minutes,
        })
    }
}
