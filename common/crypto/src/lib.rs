use base64::engine::general_purpose::{STANDARD as BASE64_STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Prefix marking a configured secret as base64 (standard alphabet) encoded.
pub const BASE64_SECRET_PREFIX: &str = "base64:";

/// Errors produced by the common-crypto helpers.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
    #[error("invalid HMAC key length")]
    InvalidMacKey,
}

/// Process-wide HMAC signing secret. The bytes are wiped on drop.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    /// Parse a configured secret. Values carrying the `base64:` prefix are
    /// decoded, anything else is taken as raw UTF-8 bytes.
    pub fn from_config(value: &str) -> Result<Self, CryptoError> {
        let value = value.trim();
        match value.strip_prefix(BASE64_SECRET_PREFIX) {
            Some(encoded) => {
                let decoded = Zeroizing::new(BASE64_STANDARD.decode(encoded.trim())?);
                Self::from_bytes(decoded.as_slice())
            }
            None => Self::from_bytes(value.as_bytes()),
        }
    }

    /// Construct a secret from raw bytes.
    pub fn from_bytes<B>(bytes: B) -> Result<Self, CryptoError>
    where
        B: AsRef<[u8]>,
    {
        let slice = bytes.as_ref();
        if slice.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        Ok(Self(Zeroizing::new(slice.to_vec())))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecret")
            .field("bytes", &"***redacted***")
            .finish()
    }
}

/// Raw HMAC-SHA256 digest of `message` keyed by `key`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| CryptoError::InvalidMacKey)?;
    mac.update(message);
    let digest = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(out)
}

/// HMAC-SHA256 over `message`, rendered as unpadded URL-safe base64.
pub fn sign_b64url(key: &[u8], message: &[u8]) -> Result<String, CryptoError> {
    let digest = hmac_sha256(key, message)?;
    Ok(b64url_encode(digest))
}

/// Recompute the signature for `message` and compare it against `provided`
/// without short-circuiting on the first differing byte.
pub fn verify_b64url(key: &[u8], message: &[u8], provided: &str) -> Result<bool, CryptoError> {
    let expected = sign_b64url(key, message)?;
    Ok(constant_time_eq(expected.as_bytes(), provided.as_bytes()))
}

/// Constant-time byte equality. Length differences return false.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

pub fn b64url_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn b64url_decode(value: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(URL_SAFE_NO_PAD.decode(value)?)
}
