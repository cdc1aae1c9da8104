//! Auth/session collaborator.
//!
//! The feed client never looks a credential up from ambient state; a
//! [`Session`] is handed to the HTTP service and the engine explicitly.

use std::sync::RwLock;

pub trait Session: Send + Sync {
    /// Credential to attach to outgoing calls, if the session is live.
    fn credential(&self) -> Option<String>;

    /// Drop the credential.  Subsequent calls go out unauthenticated.
    fn logout(&self);

    fn is_active(&self) -> bool {
        self.credential().is_some()
    }
}

/// In-memory bearer token session.
#[derive(Debug, Default)]
pub struct TokenSession {
    token: RwLock<Option<String>>,
}

impl TokenSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl Session for TokenSession {
    fn credential(&self) -> Option<String> {
        // A poisoned lock only means a writer panicked mid-logout; treat the
        // session as gone.
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn logout(&self) {
        if let Ok(mut token) = self.token.write() {
            if token.take().is_some() {
                tracing::info!("session logged out");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_active() {
        let session = TokenSession::new("abc");
        assert!(session.is_active());
        assert_eq!(session.credential().as_deref(), Some("abc"));
    }

    #[test]
    fn logout_clears_credential() {
        let session = TokenSession::new("abc");
        session.logout();
        assert!(!session.is_active());
        assert!(session.credential().is_none());

        // idempotent
        session.logout();
        assert!(!session.is_active());
    }

    #[test]
    fn default_session_is_inactive() {
        assert!(!TokenSession::default().is_active());
    }
}
