//! Core client types.
//!
//! These types enforce their invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod api_url;
pub mod timestamp;
mod user;

pub use api_url::ApiUrl;
pub use user::{ADMIN_ROLE, User};
