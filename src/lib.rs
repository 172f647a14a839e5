//! Canvas OAuth - OAuth 2.0 authorization code flow for the Canvas LMS API
//!
//! This library builds authorization URLs, exchanges authorization codes for
//! access and refresh tokens, refreshes access tokens, and logs sessions out.
//!
//! # Features
//!
//! - Authorization and login URLs with percent-encoded parameters
//! - Precondition checks that fail before any request is sent
//! - Pluggable [`Transport`](transport::Transport) with a reqwest default
//! - Loopback callback server for command-line applications
//!
//! # Example
//!
//! ```
//! use canvas_oauth::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ClientConfig::new("https://canvas.example.com")
//!     .with_client_id("10000000000001")
//!     .with_client_secret("developer-key-secret");
//! let transport = Arc::new(HttpTransport::for_client(&config).unwrap());
//!
//! let client = OAuthClient::new(config, transport);
//! let url = client.login_url(Some("http://localhost:8080/callback")).unwrap();
//! println!("Authorization URL: {}", url);
//! ```

pub mod authorize;
pub mod callback;
pub mod config;
pub mod error;
pub mod oauth;
pub mod session;
pub mod transport;
pub mod validate;

pub use error::{OAuthError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::authorize::{build_authorization_url, build_login_url, AuthorizationRequest};
    pub use crate::callback::{open_in_browser, CallbackResult, CallbackServer};
    pub use crate::config::ClientConfig;
    pub use crate::error::{OAuthError, Result};
    pub use crate::oauth::{LogoutResponse, OAuthClient, TokenResponse};
    pub use crate::session::Session;
    pub use crate::transport::{ApiRequest, HttpTransport, HttpTransportConfig, Method, Transport};
}
