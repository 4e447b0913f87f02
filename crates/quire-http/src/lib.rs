//! quire-http - HTTP backend for the quire session core.
//!
//! [`HttpAuthApi`] speaks the `/api/auth/*` endpoints, and
//! [`AuthorizedClient`] is the request primitive every other feature area
//! uses to reach the backend with a fresh bearer token.

mod api;
mod authorized;
mod client;
mod config;
mod endpoints;

use std::sync::Arc;

use quire_core::{Result, SessionManager, TokenStore};

pub use api::HttpAuthApi;
pub use authorized::{AuthorizedClient, FetchOptions, compose_headers};
pub use client::{HttpClient, read_empty, read_json};
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};

/// Build a session manager and an authorizing client that share one
/// connection pool and one token store.
pub fn connect(
    config: &ClientConfig,
    store: TokenStore,
) -> Result<(SessionManager, AuthorizedClient)> {
    let client = HttpClient::new(config)?;
    let api = Arc::new(HttpAuthApi::from_client(client.clone()));
    let session = SessionManager::new(api, store);
    let authorized = AuthorizedClient::new(session.clone(), client);
    Ok((session, authorized))
}
