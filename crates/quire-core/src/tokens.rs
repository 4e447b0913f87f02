//! Token types for bearer authentication.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};

use crate::error::{Error, InvalidInputError};

/// An access token for authorized API requests.
///
/// Access tokens are short-lived signed tokens whose payload carries an
/// `exp` claim. The client reads that claim to decide when to refresh but
/// never verifies the signature: the expiry is a hint that saves a doomed
/// round trip, the backend still makes the authorization decision.
///
/// # Security
///
/// Never logged or displayed in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token. The value is stored verbatim.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the `exp` claim from the token payload.
    ///
    /// The payload is the middle dot-separated segment, base64url encoded
    /// (standard alphabet and trailing padding are tolerated).
    pub fn expires_at(&self) -> Result<DateTime<Utc>, Error> {
        let payload = self
            .0
            .split('.')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| malformed("missing payload segment"))?;

        let payload = payload.trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .or_else(|_| STANDARD_NO_PAD.decode(payload))
            .map_err(|e| malformed(format!("payload is not base64: {}", e)))?;

        let claims: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| malformed(format!("payload is not JSON: {}", e)))?;

        let exp = claims
            .get("exp")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.floor() as i64)))
            .ok_or_else(|| malformed("payload has no numeric exp claim"))?;

        DateTime::from_timestamp(exp, 0).ok_or_else(|| malformed("exp claim out of range"))
    }

    /// Returns true if the token is expired at `now`.
    ///
    /// A token with `exp = T` is expired for every `now >= T`. Tokens whose
    /// expiry cannot be read are treated as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Ok(expires_at) => now >= expires_at,
            Err(_) => true,
        }
    }

    /// Returns true if the token is expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

fn malformed(reason: impl Into<String>) -> Error {
    InvalidInputError::Token {
        reason: reason.into(),
    }
    .into()
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A refresh token for obtaining a new credential pair.
///
/// Refresh tokens are opaque to the client.
///
/// # Security
///
/// Never logged or displayed in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh and logout requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// The access/refresh token tuple issued by the authentication endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: AccessToken::new(access_token),
            refresh_token: RefreshToken::new(refresh_token),
        }
    }
}
