//! Session identity type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role tag the backend assigns to administrators.
pub const ADMIN_ROLE: &str = "Admin";

/// The profile record of the signed-in user.
///
/// Cached next to the credential pair so a client can show who is signed in
/// before the backend answers, and replaced by the server copy as soon as a
/// live access token allows fetching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar_id: Option<String>,
    /// Flat role tag; only `"Admin"` carries meaning on the client.
    pub role: String,
    #[serde(with = "super::timestamp")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "super::timestamp")]
    pub modified_on: DateTime<Utc>,
}

impl User {
    /// Returns true if the user holds the administrator role.
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}
