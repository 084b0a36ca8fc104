use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use common_crypto::SigningSecret;

/// Supplies the HMAC key. Implementations must return the same bytes on every
/// instance that should accept each other's tokens.
pub trait SecretProvider: Send + Sync {
    fn current(&self) -> &[u8];
}

impl SecretProvider for SigningSecret {
    fn current(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Identifies the tenant a request is executing under, if any.
pub trait TenantResolver {
    fn current(&self) -> Option<String>;
}

/// Fixed tenant, `None` for single-tenant deployments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticTenant(Option<String>);

impl StaticTenant {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self(Some(tenant_id.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn from_option(tenant_id: Option<String>) -> Self {
        Self(tenant_id)
    }
}

impl TenantResolver for StaticTenant {
    fn current(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn at(unix_seconds: i64) -> Self {
        Self(AtomicI64::new(unix_seconds))
    }

    pub fn set(&self, unix_seconds: i64) {
        self.0.store(unix_seconds, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
