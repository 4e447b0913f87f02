//! quire-core - Session, token and storage primitives for the quire client.
//!
//! All authenticated traffic flows through a [`SessionManager`]: it owns the
//! login/register/logout/refresh lifecycle, persists the credential pair in a
//! [`TokenStore`], and hands out access tokens that are renewed before they
//! are used.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quire_core::{AuthApi, Credentials, SessionManager, TokenStore};
//!
//! # async fn example(api: Arc<dyn AuthApi>) -> Result<(), quire_core::Error> {
//! let session = SessionManager::new(api, TokenStore::in_memory());
//! session.check_auth().await;
//!
//! let user = session.login(&Credentials::new("alice", "s3cret")).await?;
//! println!("Signed in as {}", user.username);
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod error;
pub mod session;
pub mod storage;
pub mod token_store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::{Credentials, Registration};
pub use error::Error;
pub use session::{SessionManager, SessionState};
pub use storage::{MemoryStorage, NullStorage};
pub use token_store::TokenStore;
pub use tokens::{AccessToken, CredentialPair, RefreshToken};
pub use traits::{AuthApi, AuthResponse, Storage};
pub use types::{ApiUrl, User};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
