//! Error types for the quire client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, storage and input validation errors.

use std::fmt;
use thiserror::Error;

/// Message used when a rejected request carries no readable error body.
pub const GENERIC_FAILURE_MESSAGE: &str = "request failed";

/// The unified error type for quire operations.
///
/// This error type covers all possible failure modes in the library,
/// with explicit variants to allow callers to handle specific cases.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (rejected credentials, expired session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (non-success status, unexpected response body).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (invalid base URL, malformed token).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Persistence medium errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Returns true if this error means the session is gone and the user
    /// has to sign in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::SessionExpired) | Error::Auth(AuthError::RefreshTokenMissing)
        )
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend refused a login, register or refresh call.
    ///
    /// The message is the backend's own when it supplied one.
    #[error("{message}")]
    Rejected { message: String },

    /// The session could not be renewed and has been cleared.
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// A refresh was requested but no refresh token is stored.
    #[error("refresh token not found")]
    RefreshTokenMissing,

    /// The operation requires a signed-in user.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl AuthError {
    /// Build a rejection from an optional backend message.
    pub fn rejected(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        AuthError::Rejected { message }
    }
}

/// Protocol-level errors from backend responses.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error message from the server, if its body carried one.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// Check if the backend refused the caller's credentials.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

impl From<ProtocolError> for AuthError {
    fn from(err: ProtocolError) -> Self {
        AuthError::rejected(err.message)
    }
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the medium failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// A value could not be encoded for storage.
    #[error("could not encode '{key}': {message}")]
    Encode { key: String, message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Access token payload could not be decoded.
    #[error("malformed access token: {reason}")]
    Token { reason: String },

    /// Invalid header name or value supplied by the caller.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
