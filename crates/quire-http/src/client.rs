//! HTTP client for the auth endpoints.

use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use quire_core::error::{Error, InvalidInputError, ProtocolError, TransportError};
use quire_core::{AccessToken, ApiUrl, Result};

use crate::config::ClientConfig;
use crate::endpoints::ErrorResponse;

/// HTTP client bound to one backend.
///
/// Clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: ApiUrl,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: config.build_http_client()?,
            base_url: config.base_url.clone(),
        })
    }

    /// Returns the backend this client is configured for.
    pub fn base_url(&self) -> &ApiUrl {
        &self.base_url
    }

    pub(crate) fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// POST a JSON body without credentials and decode the JSON reply.
    #[instrument(skip(self, body), fields(api = %self.base_url))]
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.base_url.endpoint(path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response).await
    }

    /// POST a JSON body, with a bearer token if one is given, ignoring the
    /// reply body.
    #[instrument(skip(self, body, token), fields(api = %self.base_url))]
    pub async fn post_no_response<B>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AccessToken>,
    ) -> Result<()>
    where
        B: Serialize,
    {
        let url = self.base_url.endpoint(path);
        debug!(%url, authed = token.is_some(), "POST (no response)");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, bearer(token)?);
        }
        let response = request.send().await.map_err(transport_error)?;

        read_empty(response).await
    }

    /// GET with a bearer token and decode the JSON reply.
    #[instrument(skip(self, token), fields(api = %self.base_url))]
    pub async fn get_authed<R>(&self, path: &str, token: &AccessToken) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = self.base_url.endpoint(path);
        debug!(%url, "GET (authenticated)");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, bearer(token)?)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response).await
    }
}

/// Decode a JSON reply, or turn a non-success status into a
/// [`ProtocolError`] carrying the backend's message.
pub async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
    let status = response.status();
    trace!(status = %status, "Response");

    if !status.is_success() {
        return Err(Error::Protocol(parse_error_response(response).await));
    }

    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        Error::Protocol(ProtocolError::new(
            status.as_u16(),
            Some(format!("invalid response body: {}", e)),
        ))
    })
}

/// Like [`read_json`] for replies whose body is irrelevant.
pub async fn read_empty(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    trace!(status = %status, "Response");

    if status.is_success() {
        Ok(())
    } else {
        Err(Error::Protocol(parse_error_response(response).await))
    }
}

async fn parse_error_response(response: reqwest::Response) -> ProtocolError {
    let status = response.status().as_u16();

    match response.json::<ErrorResponse>().await {
        Ok(body) => ProtocolError::new(status, body.into_message()),
        Err(_) => ProtocolError::new(status, None),
    }
}

pub(crate) fn bearer(token: &AccessToken) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str())).map_err(|e| {
        InvalidInputError::Header {
            name: AUTHORIZATION.to_string(),
            reason: e.to_string(),
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}

pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let err = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(err)
}
