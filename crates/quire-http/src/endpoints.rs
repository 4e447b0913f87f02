//! Auth endpoint paths and their request/response bodies.

use serde::{Deserialize, Serialize};

use quire_core::types::timestamp;
use quire_core::{AuthResponse, CredentialPair, User};

pub const REGISTER: &str = "/api/auth/register";

pub const LOGIN: &str = "/api/auth/login";

pub const REFRESH: &str = "/api/auth/refresh";

/// Revokes the refresh token server-side.
pub const LOGOUT: &str = "/api/auth/logout";

/// Profile of the user the bearer token belongs to.
pub const CURRENT_USER: &str = "/api/auth/me";

// Request bodies carry passwords or refresh tokens, so none derive Debug

#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub username_or_email: &'a str,
    pub password: &'a str,
}

/// Body of both the refresh and the logout call.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from register, login and refresh.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseBody {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub access_token_expires: Option<String>,
    #[serde(default)]
    pub refresh_token_expires: Option<String>,
    pub user: User,
}

impl From<AuthResponseBody> for AuthResponse {
    fn from(body: AuthResponseBody) -> Self {
        AuthResponse {
            credentials: CredentialPair::new(body.access_token, body.refresh_token),
            access_token_expires: body.access_token_expires.as_deref().and_then(timestamp::parse),
            refresh_token_expires: body
                .refresh_token_expires
                .as_deref()
                .and_then(timestamp::parse),
            user: body.user,
        }
    }
}

/// Error body. Validation failures arrive as problem details with a
/// `title` and no `message`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ErrorResponse {
    pub fn into_message(self) -> Option<String> {
        self.message
            .filter(|m| !m.trim().is_empty())
            .or(self.title)
    }
}
