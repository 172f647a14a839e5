/// In-memory session state for an authenticated client
use serde::{Deserialize, Serialize};

/// Tokens held by a single client instance
///
/// Only the token exchange and refresh operations write to a session, and
/// only after the provider answered successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl Session {
    /// Create an empty, unauthenticated session
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a session from tokens obtained earlier
    pub fn with_tokens(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Whether an access token is present
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub(crate) fn set_access_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    pub(crate) fn set_refresh_token(&mut self, token: String) {
        self.refresh_token = Some(token);
    }
}
