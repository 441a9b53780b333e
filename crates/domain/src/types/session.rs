//! Session snapshot exposed by the token store

use serde::{Deserialize, Serialize};

use super::user::User;

/// Point-in-time view of the persisted session.
///
/// Readers always receive a clone; the only way to change a session is
/// through the token store's set/clear operations.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Cached identity from the last login or `/auth/me`
    pub identity: Option<User>,
}

impl Session {
    /// True when no entry is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.identity.is_none()
    }

    /// True when a refresh can be attempted.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("identity", &self.identity.as_ref().map(|u| u.username.as_str()))
            .finish()
    }
}
