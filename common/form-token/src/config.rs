use std::sync::Arc;

use crate::error::{FormTokenError, FormTokenResult};
use crate::provider::SecretProvider;

/// Longest accepted form identifier, counted in characters.
pub const MAX_FORM_LENGTH: usize = 100;
pub const MIN_TTL_MINUTES: i64 = 1;
pub const MAX_TTL_MINUTES: i64 = 1440;
pub const DEFAULT_TTL_MINUTES: i64 = 30;
pub const DEFAULT_FORM: &str = "generic";

/// Immutable configuration shared by the issuer and the verifier.
#[derive(Clone)]
pub struct FormTokenConfig {
    /// Source of the HMAC key.
    pub secret: Arc<dyn SecretProvider>,
    /// Form identifier substituted when a caller does not name one.
    pub default_form: String,
    /// TTL used when a caller does not request one.
    pub default_ttl_minutes: i64,
}

impl FormTokenConfig {
    /// Construct config with the `generic` default form and a 30 minute TTL.
    pub fn new<S>(secret: S) -> Self
    where
        S: SecretProvider + 'static,
    {
        Self::with_provider(Arc::new(secret))
    }

    pub fn with_provider(secret: Arc<dyn SecretProvider>) -> Self {
        Self {
            secret,
            default_form: DEFAULT_FORM.to_string(),
            default_ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }

    pub fn with_default_form(mut self, form: impl Into<String>) -> Self {
        self.default_form = form.into();
        self
    }

    pub fn with_default_ttl(mut self, minutes: i64) -> Self {
        self.default_ttl_minutes = minutes;
        self
    }

    /// The defaults must themselves satisfy the issuance rules.
    pub fn validate(&self) -> FormTokenResult<()> {
        let form_len = self.default_form.chars().count();
        if form_len == 0 || form_len > MAX_FORM_LENGTH {
            return Err(FormTokenError::Config(format!(
                "default form must be 1..={MAX_FORM_LENGTH} characters, got {form_len}"
            )));
        }
        if !(MIN_TTL_MINUTES..=MAX_TTL_MINUTES).contains(&self.default_ttl_minutes) {
            return Err(FormTokenError::Config(format!(
                "default ttl must be within {MIN_TTL_MINUTES}..={MAX_TTL_MINUTES} minutes, got {}",
                self.default_ttl_minutes
            )));
        }
        if self.secret.current().is_empty() {
            return Err(FormTokenError::Config("signing secret is empty".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for FormTokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormTokenConfig")
            .field("secret", &"***redacted***")
            .field("default_form", &self.default_form)
            .field("default_ttl_minutes", &self.default_ttl_minutes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_crypto::SigningSecret;

    fn secret() -> SigningSecret {
        SigningSecret::from_config("config-test-secret").expect("secret")
    }

    #[test]
    fn defaults_are_generic_and_thirty_minutes() {
        let config = FormTokenConfig::new(secret());
        assert_eq!(config.default_form, "generic");
        assert_eq!(config.default_ttl_minutes, 30);
        config.validate().expect("defaults valid");
    }

    #[test]
    fn rejects_out_of_range_default_ttl() {
        let config = FormTokenConfig::new(secret()).with_default_ttl(0);
        assert!(matches!(config.validate(), Err(FormTokenError::Config(_))));
        let config = FormTokenConfig::new(secret()).with_default_ttl(1441);
        assert!(matches!(config.validate(), Err(FormTokenError::Config(_))));
    }

    #[test]
    fn rejects_oversized_default_form() {
        let config = FormTokenConfig::new(secret()).with_default_form("x".repeat(101));
        assert!(matches!(config.validate(), Err(FormTokenError::Config(_))));
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", FormTokenConfig::new(secret()));
        assert!(!rendered.contains("config-test-secret"));
    }
}
