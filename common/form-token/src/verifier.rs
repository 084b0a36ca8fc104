use std::sync::Arc;

use common_crypto::verify_b64url;
use tracing::debug;

use crate::claims::Claims;
use crate::config::FormTokenConfig;
use crate::error::{FormTokenResult, Rejection};
use crate::provider::{Clock, SystemClock, TenantResolver};
use crate::token::FormToken;

#[derive(Clone)]
pub struct FormTokenVerifier {
    config: FormTokenConfig,
    clock: Arc<dyn Clock>,
}

impl FormTokenVerifier {
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

    /// Verify against the resolver's tenant at the current time.
    pub fn verify(
        &self,
        token: &str,
        expected_form: Option<&str>,
        tenant: &dyn TenantResolver,
    ) -> Result<Claims, Rejection> {
        let tenant_id = tenant.current();
        self.verify_at(token, expected_form, tenant_id.as_deref(), self.clock.now())
    }

    /// Checks run in a fixed order and stop at the first failure: shape,
    /// signature, payload decoding, expiry, tenant, form.
    pub fn verify_at(
        &self,
        token: &str,
        expected_form: Option<&str>,
        tenant_id: Option<&str>,
        now: i64,
    ) -> Result<Claims, Rejection> {
        let result = self.check(token, expected_form, tenant_id, now);
        match &result {
            Ok(claims) => debug!(
                form = %claims.form,
                tenant_id = tenant_id.unwrap_or("-"),
                "verified public form token"
            ),
            Err(reason) => debug!(
                reason = reason.code(),
                tenant_id = tenant_id.unwrap_or("-"),
                "rejected public form token"
            ),
        }
        result
    }

    fn check(
        &self,
        token: &str,
        expected_form: Option<&str>,
        tenant_id: Option<&str>,
        now: i64,
    ) -> Result<Claims, Rejection> {
        let token = FormToken::parse(token)?;

        let signature_ok = verify_b64url(
            self.config.secret.current(),
            token.payload().as_bytes(),
            token.signature(),
        )
        .map_err(|_| Rejection::BadSignature)?;
        if !signature_ok {
            return Err(Rejection::BadSignature);
        }

        let claims = Claims::from_segment(token.payload())?;

        if claims.is_expired_at(now) {
            return Err(Rejection::Expired);
        }
        if claims.tenant_id.as_deref() != tenant_id {
            return Err(Rejection::TenantMismatch);
        }
        if let Some(expected) = expected_form {
            if expected != claims.form {
                return Err(Rejection::FormMismatch);
            }
        }
        Ok(claims)
    }
}
