//! Core traits for the authentication backend and session persistence.

mod auth_api;
mod storage;

pub use auth_api::{AuthApi, AuthResponse};
pub use storage::Storage;
