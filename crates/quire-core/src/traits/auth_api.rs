//! Authentication backend trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::User;
use crate::{AccessToken, CredentialPair, Credentials, RefreshToken, Registration, Result};

/// Successful outcome of a login, register or refresh call.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    /// The newly issued credential pair.
    pub credentials: CredentialPair,
    /// Server-reported access token expiry, if it sent one.
    pub access_token_expires: Option<DateTime<Utc>>,
    /// Server-reported refresh token expiry, if it sent one.
    pub refresh_token_expires: Option<DateTime<Utc>>,
    /// The identity the credentials belong to.
    pub user: User,
}

/// The authentication endpoint.
///
/// Implementations only speak the wire protocol; they never touch the
/// token store. Rejections carry the backend's message as
/// [`AuthError::Rejected`](crate::error::AuthError::Rejected).
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Create an account and sign it in.
    async fn register(&self, registration: &Registration) -> Result<AuthResponse>;

    /// Exchange credentials for a credential pair.
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;

    /// Exchange a refresh token for a new credential pair.
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<AuthResponse>;

    /// Invalidate a refresh token on the server.
    async fn logout(
        &self,
        refresh_token: &RefreshToken,
        access_token: Option<&AccessToken>,
    ) -> Result<()>;

    /// Fetch the identity the access token belongs to.
    async fn current_user(&self, access_token: &AccessToken) -> Result<User>;
}
