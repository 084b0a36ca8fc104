use form_token_service::app::cors_layer;
use form_token_service::config::load_service_config;
use form_token_service::{build_router, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_service_config()?;
    let state = AppState::from_config(&config)?;
    info!(
        default_form = %config.default_form,
        default_ttl_minutes = config.default_ttl_minutes,
        fallback_tenant = config.fallback_tenant.as_deref().unwrap_or("-"),
        "Form token issuer initialised"
    );

    let app = build_router(state).layer(cors_layer(&config.cors_origins));

    let addr = config.socket_addr()?;
    info!(%addr, "starting form-token-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
