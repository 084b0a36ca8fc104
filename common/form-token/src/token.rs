use crate::error::Rejection;

/// A token split into its two wire segments. Nothing here is trusted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormToken<'a> {
    payload: &'a str,
    signature: &'a str,
}

impl<'a> FormToken<'a> {
    /// Split on the first `.`. Both segments must be non-empty and the
    /// signature segment may not contain a further separator.
    pub fn parse(token: &'a str) -> Result<Self, Rejection> {
        let (payload, signature) = token.split_once('.').ok_or(Rejection::Malformed)?;
        if payload.is_empty() || signature.is_empty() || signature.contains('.') {
            return Err(Rejection::Malformed);
        }
        Ok(Self { payload, signature })
    }

    pub fn payload(&self) -> &'a str {
        self.payload
    }

    pub fn signature(&self) -> &'a str {
        self.signature
    }
}
