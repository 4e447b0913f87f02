//! Durable storage of the credential pair and cached identity.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::{MemoryStorage, NullStorage};
use crate::traits::Storage;
use crate::types::User;
use crate::{AccessToken, CredentialPair, RefreshToken, Result};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key of the JSON-encoded identity.
pub const USER_KEY: &str = "user";

/// Typed access to the session keys of a [`Storage`] medium.
///
/// Pure data access: no validation of token shape, no network calls.
/// Cheap to clone; clones share the medium.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// A store over process-local memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// A store for non-interactive contexts: always empty.
    pub fn null() -> Self {
        Self::new(Arc::new(NullStorage))
    }

    /// Store both tokens verbatim, replacing any previous pair.
    pub fn set_tokens(&self, pair: &CredentialPair) -> Result<()> {
        self.storage.set_all(&[
            (ACCESS_TOKEN_KEY, pair.access_token.as_str()),
            (REFRESH_TOKEN_KEY, pair.refresh_token.as_str()),
        ])
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.read(ACCESS_TOKEN_KEY).map(AccessToken::new)
    }

    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.read(REFRESH_TOKEN_KEY).map(RefreshToken::new)
    }

    /// Both tokens, if both are stored.
    pub fn credentials(&self) -> Option<CredentialPair> {
        Some(CredentialPair {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
        })
    }

    /// Cache the identity as JSON.
    pub fn set_user(&self, user: &User) -> Result<()> {
        let json = serde_json::to_string(user).map_err(|e| StorageError::Encode {
            key: USER_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.storage.set(USER_KEY, &json)
    }

    /// The cached identity. Missing or corrupt data reads as `None`.
    pub fn user(&self) -> Option<User> {
        let raw = self.read(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed cached user");
                None
            }
        }
    }

    /// Persist a full authentication result: pair first, then identity.
    pub fn save_session(&self, pair: &CredentialPair, user: &User) -> Result<()> {
        self.set_tokens(pair)?;
        self.set_user(user)
    }

    /// Remove both tokens and the cached identity. Idempotent.
    pub fn clear(&self) -> Result<()> {
        debug!("Clearing stored session");
        self.storage
            .remove_all(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY])
    }

    /// Returns true if nothing session-related is stored.
    pub fn is_empty(&self) -> bool {
        self.read(ACCESS_TOKEN_KEY).is_none()
            && self.read(REFRESH_TOKEN_KEY).is_none()
            && self.read(USER_KEY).is_none()
    }

    // Empty strings are treated as absent
    fn read(&self, key: &str) -> Option<String> {
        self.storage.get(key).filter(|value| !value.is_empty())
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};

    use crate::types::User;

    pub fn user(name: &str) -> User {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        User {
            id: format!("id-{}", name),
            username: name.to_string(),
            email: format!("{}@example.com", name),
            avatar_id: None,
            role: "User".to_string(),
            created_on: at,
            modified_on: at,
        }
    }
}
