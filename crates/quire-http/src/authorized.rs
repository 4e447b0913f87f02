//! Authorizing request client.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response};
use serde::Serialize;
use tracing::{debug, instrument};

use quire_core::error::InvalidInputError;
use quire_core::{AccessToken, Result, SessionManager};

use crate::client::{HttpClient, bearer, transport_error};

/// Extra headers and body for [`AuthorizedClient::fetch`].
#[derive(Debug, Default)]
pub struct FetchOptions {
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a caller header. The client's own `Content-Type` and
    /// `Authorization` still take precedence.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_error = |reason: String| InvalidInputError::Header {
            name: name.to_string(),
            reason,
        };
        let name_value =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| header_error(e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| header_error(e.to_string()))?;
        self.headers.append(name_value, value);
        Ok(self)
    }

    /// Use `body` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| InvalidInputError::Other {
            message: format!("request body is not serializable: {}", e),
        })?;
        self.body = Some(bytes);
        Ok(self)
    }
}

/// Sends requests with the current access token attached.
///
/// Every request first asks the [`SessionManager`] for a usable token, so an
/// expired access token is renewed before anything reaches the network. If
/// renewal fails the request is not sent and
/// [`AuthError::SessionExpired`](quire_core::error::AuthError::SessionExpired)
/// is returned. Responses come back unmodified, whatever their status.
#[derive(Clone)]
pub struct AuthorizedClient {
    session: SessionManager,
    client: HttpClient,
}

impl AuthorizedClient {
    pub fn new(session: SessionManager, client: HttpClient) -> Self {
        Self { session, client }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn http(&self) -> &HttpClient {
        &self.client
    }

    /// Send a request to `target`, a path on the backend or an absolute URL.
    #[instrument(skip(self, method, options), fields(method = %method))]
    pub async fn fetch(
        &self,
        method: Method,
        target: &str,
        options: FetchOptions,
    ) -> Result<Response> {
        let token = self.session.valid_access_token().await?;

        let url = self.client.base_url().resolve(target);
        let headers = compose_headers(options.headers, token.as_ref())?;
        debug!(%url, authed = token.is_some(), "Sending request");

        let mut request = self.client.inner().request(method, &url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }
        let response = request.send().await.map_err(transport_error)?;

        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    pub async fn get(&self, target: &str) -> Result<Response> {
        self.fetch(Method::GET, target, FetchOptions::new()).await
    }

    pub async fn delete(&self, target: &str) -> Result<Response> {
        self.fetch(Method::DELETE, target, FetchOptions::new()).await
    }

    pub async fn post_json<T>(&self, target: &str, body: &T) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.fetch(Method::POST, target, FetchOptions::new().json(body)?)
            .await
    }

    pub async fn put_json<T>(&self, target: &str, body: &T) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.fetch(Method::PUT, target, FetchOptions::new().json(body)?)
            .await
    }

    pub async fn patch_json<T>(&self, target: &str, body: &T) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.fetch(Method::PATCH, target, FetchOptions::new().json(body)?)
            .await
    }
}

/// Merge caller headers with the client's own.
///
/// Caller headers go underneath: `Content-Type: application/json` always
/// wins, and so does `Authorization` when a token is present.
pub fn compose_headers(caller: HeaderMap, token: Option<&AccessToken>) -> Result<HeaderMap> {
    let mut headers = caller;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        headers.insert(AUTHORIZATION, bearer(token)?);
    }
    Ok(headers)
}
