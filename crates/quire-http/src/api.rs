//! HTTP implementation of [`AuthApi`].

use async_trait::async_trait;
use tracing::{debug, instrument};

use quire_core::error::{AuthError, Error};
use quire_core::{
    AccessToken, AuthApi, AuthResponse, Credentials, RefreshToken, Registration, Result, User,
};

use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::endpoints::{
    self, AuthResponseBody, LoginRequest, RefreshTokenRequest, RegisterRequest,
};

/// Speaks the backend's `/api/auth/*` endpoints.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: HttpClient,
}

impl HttpAuthApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self::from_client(HttpClient::new(config)?))
    }

    pub fn from_client(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    #[instrument(skip(self, registration), fields(username = %registration.username()))]
    async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        let request = RegisterRequest {
            username: registration.username(),
            email: registration.email(),
            password: registration.password(),
        };
        let body: AuthResponseBody = self
            .client
            .post(endpoints::REGISTER, &request)
            .await
            .map_err(rejected)?;

        debug!(user_id = %body.user.id, "Account created");
        Ok(body.into())
    }

    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let request = LoginRequest {
            username_or_email: credentials.identifier(),
            password: credentials.password(),
        };
        let body: AuthResponseBody = self
            .client
            .post(endpoints::LOGIN, &request)
            .await
            .map_err(rejected)?;

        debug!(user_id = %body.user.id, "Credentials accepted");
        Ok(body.into())
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<AuthResponse> {
        let request = RefreshTokenRequest {
            refresh_token: refresh_token.as_str(),
        };
        let body: AuthResponseBody = self
            .client
            .post(endpoints::REFRESH, &request)
            .await
            .map_err(rejected)?;

        Ok(body.into())
    }

    #[instrument(skip(self, refresh_token, access_token))]
    async fn logout(
        &self,
        refresh_token: &RefreshToken,
        access_token: Option<&AccessToken>,
    ) -> Result<()> {
        let request = RefreshTokenRequest {
            refresh_token: refresh_token.as_str(),
        };
        self.client
            .post_no_response(endpoints::LOGOUT, &request, access_token)
            .await
    }

    #[instrument(skip(self, access_token))]
    async fn current_user(&self, access_token: &AccessToken) -> Result<User> {
        self.client
            .get_authed(endpoints::CURRENT_USER, access_token)
            .await
    }
}

// A refused login, register or refresh surfaces the backend's own message
fn rejected(err: Error) -> Error {
    match err {
        Error::Protocol(protocol) => Error::Auth(AuthError::from(protocol)),
        other => other,
    }
}
