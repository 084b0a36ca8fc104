//! Resolution of loosely typed request fields into issuance and verification
//! parameters. Query strings arrive as text, JSON bodies as arbitrary values;
//! both are read through `serde_json::Value`.

use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Issuance input after source precedence has been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueParams {
    pub form: Option<String>,
    pub ttl_minutes: Option<i64>,
}

impl IssueParams {
    /// `form` comes from the route path, then the query, then the body; the
    /// first non-blank value wins. `ttl` comes from the body, then the query.
    pub fn from_sources(
        path_form: Option<&str>,
        query: &Map<String, Value>,
        body: &Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let mut form = path_form.and_then(normalize_text);
        if form.is_none() {
            form = first_text(
                [query.get("form"), body.get("form")],
                ValidationError::FormNotString,
            )?;
        }

        let mut ttl_minutes = None;
        for candidate in [body.get("ttl"), query.get("ttl")].into_iter().flatten() {
            if let Some(ttl) = parse_ttl(candidate)? {
                ttl_minutes = Some(ttl);
                break;
            }
        }

        Ok(Self { form, ttl_minutes })
    }
}

/// Verification input: a required token and an optional form to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyParams {
    pub token: String,
    pub form: Option<String>,
}

impl VerifyParams {
    /// Body values take precedence over the query string.
    pub fn from_sources(
        query: &Map<String, Value>,
        body: &Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let token = first_text(
            [body.get("token"), query.get("token")],
            ValidationError::TokenNotString,
        )?
        .ok_or(ValidationError::TokenMissing)?;
        let form = first_text(
            [body.get("form"), query.get("form")],
            ValidationError::FormNotString,
        )?;
        Ok(Self { token, form })
    }
}

fn first_text<const N: usize>(
    candidates: [Option<&Value>; N],
    not_text: ValidationError,
) -> Result<Option<String>, ValidationError> {
    for candidate in candidates.into_iter().flatten() {
        match candidate {
            Value::Null => continue,
            Value::String(text) => {
                if let Some(value) = normalize_text(text) {
                    return Ok(Some(value));
                }
            }
            _ => return Err(not_text),
        }
    }
    Ok(None)
}

/// Whitespace is trimmed; blank strings count as absent.
fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Integers and integer-valued strings are accepted; range is checked at
/// issuance.
pub fn parse_ttl(value: &Value) -> Result<Option<i64>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_i64()
            .map(Some)
            .ok_or(ValidationError::TtlNotInteger),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ValidationError::TtlNotInteger)
        }
        _ => Err(ValidationError::TtlNotInteger),
    }
}
