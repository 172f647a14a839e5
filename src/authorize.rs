/// Authorization URL construction
use tracing::debug;

/// Path of the browser-facing authorization endpoint
pub const AUTHORIZE_PATH: &str = "/login/oauth2/auth";
/// Path of the token endpoint
pub const TOKEN_PATH: &str = "/login/oauth2/token";
/// Scope requested by [`build_login_url`]
pub const USERINFO_SCOPE: &str = "/auth/userinfo";

/// Parameters for an authorization URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub callback_url: String,
    pub scopes: Option<String>,
}

impl AuthorizationRequest {
    pub fn new(callback_url: impl Into<String>, scopes: Option<&str>) -> Self {
        Self {
            callback_url: callback_url.into(),
            scopes: scopes.map(str::to_string),
        }
    }

    /// Render the request against a client id and API host
    pub fn to_url(&self, client_id: &str, api_host: &str) -> String {
        build_authorization_url(
            client_id,
            api_host,
            &self.callback_url,
            self.scopes.as_deref(),
        )
    }
}

/// Percent-encode a query component
///
/// Everything except ASCII alphanumerics and `-_.~` is escaped, and a
/// space becomes `%20`.
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Build the authorization URL the user should open
///
/// # Examples
///
/// ```
/// use canvas_oauth::authorize::build_authorization_url;
///
/// let url = build_authorization_url(
///     "42",
///     "http://canvas.example.com",
///     "http://www.example.com/return?id=1234",
///     Some("cool/scope"),
/// );
/// assert_eq!(
///     url,
///     "http://canvas.example.com/login/oauth2/auth?client_id=42&response_type=code\
///      &redirect_uri=http%3A%2F%2Fwww.example.com%2Freturn%3Fid%3D1234&scopes=cool%2Fscope"
/// );
/// ```
pub fn build_authorization_url(
    client_id: &str,
    api_host: &str,
    callback_url: &str,
    scopes: Option<&str>,
) -> String {
    let mut url = format!(
        "{}{}?client_id={}&response_type=code&redirect_uri={}",
        api_host,
        AUTHORIZE_PATH,
        client_id,
        percent_encode(callback_url)
    );

    if let Some(scopes) = scopes {
        url.push_str(&format!("&scopes={}", percent_encode(scopes)));
    }

    debug!(host = api_host, scoped = scopes.is_some(), "Built authorization URL");
    url
}

/// Build an authorization URL requesting only the user info scope
pub fn build_login_url(client_id: &str, api_host: &str, callback_url: &str) -> String {
    build_authorization_url(client_id, api_host, callback_url, Some(USERINFO_SCOPE))
}
