use anyhow::{anyhow, Context, Result};
use common_crypto::SigningSecret;
use common_form_token::{FormTokenConfig, DEFAULT_FORM, DEFAULT_TTL_MINUTES};
use std::env;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_PORT: u16 = 8090;
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:5173",
];

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub secret: SigningSecret,
    pub default_form: String,
    pub default_ttl_minutes: i64,
    pub fallback_tenant: Option<String>,
    pub cors_origins: Vec<String>,
}

impl ServiceConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid HOST '{}'", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }

    pub fn form_token_config(&self) -> FormTokenConfig {
        FormTokenConfig::new(self.secret.clone())
            .with_default_form(self.default_form.clone())
            .with_default_ttl(self.default_ttl_minutes)
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    load_service_config_from(|key| env::var(key).ok())
}

/// Parse configuration through an arbitrary lookup so tests do not have to
/// mutate the process environment.
pub fn load_service_config_from<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let raw_secret = lookup("FORM_TOKEN_SECRET")
        .and_then(|value| normalize_optional(&value))
        .or_else(|| lookup("APP_KEY").and_then(|value| normalize_optional(&value)))
        .ok_or_else(|| anyhow!("FORM_TOKEN_SECRET (or APP_KEY) must be set"))?;
    let secret = SigningSecret::from_config(&raw_secret)
        .context("Failed to parse FORM_TOKEN_SECRET")?;

    let default_form = lookup("FORM_TOKEN_DEFAULT_FORM")
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_FORM.to_string());

    let default_ttl_minutes = lookup("FORM_TOKEN_DEFAULT_TTL_MINUTES")
        .and_then(|value| normalize_optional(&value))
        .map(|value| {
            value
                .parse::<i64>()
                .map_err(|err| anyhow!("Invalid FORM_TOKEN_DEFAULT_TTL_MINUTES '{value}': {err}"))
        })
        .transpose()?
        .unwrap_or(DEFAULT_TTL_MINUTES);

    let fallback_tenant =
        lookup("FORM_TOKEN_FALLBACK_TENANT").and_then(|value| normalize_optional(&value));

    let cors_origins = lookup("FORM_TOKEN_CORS_ORIGINS")
        .map(|value| parse_list(&value))
        .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect());

    let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = lookup("PORT")
        .map(|value| {
            value
                .trim()
                .parse::<u16>()
                .map_err(|err| anyhow!("Invalid PORT '{value}': {err}"))
        })
        .transpose()?
        .unwrap_or(DEFAULT_PORT);

    let config = ServiceConfig {
        host,
        port,
        secret,
        default_form,
        default_ttl_minutes,
        fallback_tenant,
        cors_origins,
    };
    config
        .form_token_config()
        .validate()
        .context("Invalid form token defaults")?;
    Ok(config)
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
        .collect()
}
