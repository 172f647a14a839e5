/// OAuth 2.0 authorization code flow orchestration
use crate::authorize::{self, TOKEN_PATH};
use crate::config::ClientConfig;
use crate::error::{OAuthError, Result};
use crate::session::Session;
use crate::transport::{ApiRequest, Method, Transport};
use crate::validate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Token endpoint reply
///
/// Keeps the reply exactly as received and exposes the two keys this crate
/// reads. A `null` token counts as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    raw: Map<String, Value>,
}

#[derive(Deserialize)]
struct TokenFields {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    pub fn from_value(value: Value) -> Result<Self> {
        let raw = match value {
            Value::Object(map) => map,
            other => {
                return Err(OAuthError::InvalidResponse(format!(
                    "expected a JSON object, got: {}",
                    other
                )))
            }
        };
        let fields = TokenFields::deserialize(&Value::Object(raw.clone()))?;

        Ok(Self {
            access_token: fields.access_token,
            refresh_token: fields.refresh_token,
            raw,
        })
    }

    /// Look up any key of the reply, e.g. `user` or `expires_in`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// The reply as the provider sent it
    pub fn to_value(&self) -> Value {
        Value::Object(self.raw.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.raw)
    }
}

/// Logout reply
///
/// Anything other than a boolean `logged_out: true` counts as not logged out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

impl LogoutResponse {
    pub fn from_value(value: &Value) -> Self {
        Self {
            logged_out: value
                .get("logged_out")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// OAuth 2.0 client
///
/// Owns the configuration and the session of one authenticated user. Methods
/// that change the session take `&mut self`, so operations on one instance
/// cannot overlap.
pub struct OAuthClient<T: Transport> {
    config: ClientConfig,
    transport: Arc<T>,
    session: Session,
}

impl<T: Transport> OAuthClient<T> {
    /// Create a new OAuth client with an empty session
    pub fn new(config: ClientConfig, transport: Arc<T>) -> Self {
        Self::with_session(config, transport, Session::new())
    }

    /// Create a client around tokens obtained earlier
    pub fn with_session(config: ClientConfig, transport: Arc<T>, session: Session) -> Self {
        Self {
            config,
            transport,
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current access token, if authenticated
    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.session.refresh_token()
    }

    pub fn set_client_id(&mut self, client_id: Option<String>) {
        self.config.client_id = client_id;
    }

    pub fn set_client_secret(&mut self, client_secret: Option<String>) {
        self.config.client_secret = client_secret;
    }

    /// Build the URL the user opens to authorize this application
    pub fn authorization_url(
        &self,
        callback_url: Option<&str>,
        scopes: Option<&str>,
    ) -> Result<String> {
        let creds = validate::require_credentials(&self.config)?;
        let callback_url = validate::require_callback_url(callback_url)?;

        Ok(authorize::build_authorization_url(
            creds.client_id,
            self.config.api_host(),
            callback_url,
            scopes,
        ))
    }

    /// Build an authorization URL requesting only the user info scope
    pub fn login_url(&self, callback_url: Option<&str>) -> Result<String> {
        self.authorization_url(callback_url, Some(authorize::USERINFO_SCOPE))
    }

    /// Exchange an authorization code for tokens
    ///
    /// Stores the access token, and the refresh token when the reply has
    /// one. The reply is returned as received.
    pub fn exchange_code(
        &mut self,
        code: Option<&str>,
        callback_url: Option<&str>,
        scopes: Option<&str>,
    ) -> Result<TokenResponse> {
        let creds = validate::require_credentials(&self.config)?;
        let code = validate::require_code(code)?;
        let callback_url = validate::require_callback_url(callback_url)?;

        let mut request = ApiRequest::new(Method::Post, TOKEN_PATH)
            .param("client_id", creds.client_id)
            .param("client_secret", creds.client_secret)
            .param("code", code)
            .param("redirect_uri", callback_url);
        if let Some(scopes) = scopes {
            request = request.param("scopes", scopes);
        }

        debug!("Exchanging authorization code");
        let response = TokenResponse::from_value(self.transport.execute(&request)?)?;

        self.session.set_access_token(response.access_token.clone());
        if let Some(refresh_token) = &response.refresh_token {
            self.session.set_refresh_token(refresh_token.clone());
        }
        info!(
            refresh_token = response.refresh_token.is_some(),
            "Authorization code exchanged"
        );

        Ok(response)
    }

    /// Obtain a new access token with a refresh token
    ///
    /// The stored refresh token is left as is; the provider does not rotate
    /// it on refresh.
    pub fn refresh_access_token(&mut self, refresh_token: Option<&str>) -> Result<TokenResponse> {
        let creds = validate::require_credentials(&self.config)?;
        let refresh_token = validate::require_refresh_token(refresh_token)?;

        let request = ApiRequest::new(Method::Post, TOKEN_PATH)
            .param("grant_type", "refresh_token")
            .param("refresh_token", refresh_token)
            .param("client_id", creds.client_id)
            .param("client_secret", creds.client_secret);

        debug!("Refreshing access token");
        let response = TokenResponse::from_value(self.transport.execute(&request)?)?;

        self.session.set_access_token(response.access_token.clone());
        info!("Access token refreshed");

        Ok(response)
    }

    /// Revoke the current access token
    ///
    /// Returns whether the provider confirmed the logout. The session keeps
    /// its tokens either way.
    pub fn logout(&self) -> Result<bool> {
        let token = validate::require_access_token(self.session.access_token())?;

        let request = ApiRequest::new(Method::Delete, TOKEN_PATH).bearer(token);
        let response = LogoutResponse::from_value(&self.transport.execute(&request)?);

        info!(logged_out = response.logged_out, "Logout finished");
        Ok(response.logged_out)
    }
}
