/// Precondition checks run before any OAuth request
///
/// Each check fails fast with a specific [`OAuthError`]. Callers compose them
/// in a fixed order so the first failing check is the one reported.
use crate::config::ClientConfig;
use crate::error::{OAuthError, Result};
use url::Url;

/// Client id and secret borrowed from a validated config
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// Require both the client id and the secret, checking the id first
pub fn require_credentials(config: &ClientConfig) -> Result<Credentials<'_>> {
    let client_id = present(config.client_id.as_deref())
        .ok_or(OAuthError::MissingClientCredentials("client_id"))?;
    let client_secret = present(config.client_secret.as_deref())
        .ok_or(OAuthError::MissingClientCredentials("secret"))?;

    Ok(Credentials {
        client_id,
        client_secret,
    })
}

/// Require a callback URL that parses as an absolute URL with a host
pub fn require_callback_url(callback_url: Option<&str>) -> Result<&str> {
    let callback_url = present(callback_url).ok_or(OAuthError::MissingCallbackUrl)?;

    let parsed = Url::parse(callback_url)
        .map_err(|_| OAuthError::InvalidCallbackUrl(callback_url.to_string()))?;
    if !parsed.has_host() {
        return Err(OAuthError::InvalidCallbackUrl(callback_url.to_string()));
    }

    Ok(callback_url)
}

pub fn require_code(code: Option<&str>) -> Result<&str> {
    present(code).ok_or(OAuthError::MissingAuthorizationCode)
}

pub fn require_refresh_token(refresh_token: Option<&str>) -> Result<&str> {
    present(refresh_token).ok_or(OAuthError::MissingRefreshToken)
}

pub fn require_access_token(access_token: Option<&str>) -> Result<&str> {
    present(access_token).ok_or(OAuthError::MissingAccessToken)
}

// Empty strings count as absent
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
