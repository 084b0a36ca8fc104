pub mod app;
pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;

pub use app::{build_router, AppState, TenantSettings};
