//! Session lifecycle notifications

use assetdesk_domain::ClientError;

/// Observer told when the session can no longer be renewed.
///
/// Called once per failed refresh cycle, after the session has been
/// cleared. Implementations typically route the user back to login.
pub trait SessionListener: Send + Sync {
    fn session_expired(&self, reason: &ClientError);
}

impl<F> SessionListener for F
where
    F: Fn(&ClientError) + Send + Sync,
{
    fn session_expired(&self, reason: &ClientError) {
        self(reason);
    }
}
