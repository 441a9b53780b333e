//! Cached identity returned by `/auth/login` and `/auth/me`

use serde::{Deserialize, Serialize};

/// Authenticated user as reported by the API.
///
/// Only the fields the client relies on are typed; everything else the
/// server sends is preserved in `extra` so the cached copy round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
