/// Client configuration supplied by the host application
use crate::error::{OAuthError, Result};
use std::env;

/// Environment variable holding the developer key id
pub const CLIENT_ID_VAR: &str = "CANVAS_CLIENT_ID";
/// Environment variable holding the developer key secret
pub const CLIENT_SECRET_VAR: &str = "CANVAS_CLIENT_SECRET";
/// Environment variable holding the API host, e.g. `https://canvas.example.com`
pub const API_HOST_VAR: &str = "CANVAS_API_HOST";

/// OAuth client configuration
///
/// `client_id` and `client_secret` may be absent; operations that need them
/// fail with [`OAuthError::MissingClientCredentials`] instead of the
/// constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    api_host: String,
}

impl ClientConfig {
    /// Create a configuration for the given API host with no credentials
    pub fn new(api_host: impl Into<String>) -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_host: normalize_host(api_host.into()),
        }
    }

    /// Set the client id
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the client secret
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// API host without a trailing `/`
    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    /// Point the configuration at another host
    pub fn set_api_host(&mut self, api_host: impl Into<String>) {
        self.api_host = normalize_host(api_host.into());
    }

    /// Load configuration from `CANVAS_API_HOST`, `CANVAS_CLIENT_ID` and
    /// `CANVAS_CLIENT_SECRET`.
    ///
    /// Only the host is required. Empty values count as unset.
    pub fn from_env() -> Result<Self> {
        let api_host = non_empty_var(API_HOST_VAR)
            .ok_or_else(|| OAuthError::MissingField(API_HOST_VAR.to_string()))?;

        Ok(Self {
            client_id: non_empty_var(CLIENT_ID_VAR),
            client_secret: non_empty_var(CLIENT_SECRET_VAR),
            api_host: normalize_host(api_host),
        })
    }

    /// Browser-facing authorization endpoint
    pub fn authorization_endpoint(&self) -> String {
        format!("{}{}", self.api_host, crate::authorize::AUTHORIZE_PATH)
    }

    /// Token endpoint used for exchange, refresh and logout
    pub fn token_endpoint(&self) -> String {
        format!("{}{}", self.api_host, crate::authorize::TOKEN_PATH)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn normalize_host(host: String) -> String {
    host.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_credentials() {
        let config = ClientConfig::new("http://canvas.example.com")
            .with_client_id("bob")
            .with_client_secret("shh");

        assert_eq!(config.client_id.as_deref(), Some("bob"));
        assert_eq!(config.client_secret.as_deref(), Some("shh"));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("http://canvas.example.com/");
        assert_eq!(config.api_host(), "http://canvas.example.com");
        assert_eq!(
            config.token_endpoint(),
            "http://canvas.example.com/login/oauth2/token"
        );
        assert_eq!(
            config.authorization_endpoint(),
            "http://canvas.example.com/login/oauth2/auth"
        );
    }

    #[test]
    fn test_set_api_host_is_normalized() {
        let mut config = ClientConfig::new("http://canvas.example.com");
        config.set_api_host("https://other.example.com//");

        assert_eq!(config.api_host(), "https://other.example.com");
        assert_eq!(
            config.authorization_endpoint(),
            "https://other.example.com/login/oauth2/auth"
        );
    }

    #[test]
    fn test_from_env() {
        // Single test touches these variables to avoid races between tests
        env::remove_var(API_HOST_VAR);
        assert!(matches!(
            ClientConfig::from_env(),
            Err(OAuthError::MissingField(_))
        ));

        env::set_var(API_HOST_VAR, "https://canvas.example.com/");
        env::set_var(CLIENT_ID_VAR, "42");
        env::set_var(CLIENT_SECRET_VAR, "");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_host(), "https://canvas.example.com");
        assert_eq!(config.client_id.as_deref(), Some("42"));
        assert_eq!(config.client_secret, None);

        env::remove_var(API_HOST_VAR);
        env::remove_var(CLIENT_ID_VAR);
        env::remove_var(CLIENT_SECRET_VAR);
    }
}
