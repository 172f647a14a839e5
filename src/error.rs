/// Error types for Canvas OAuth operations
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("{0} required for oauth flow")]
    MissingClientCredentials(&'static str),

    #[error("callback_url required")]
    MissingCallbackUrl,

    #[error("invalid callback_url: {0}")]
    InvalidCallbackUrl(String),

    #[error("code required")]
    MissingAuthorizationCode,

    #[error("refresh token required for oauth flow")]
    MissingRefreshToken,

    #[error("token required for api calls")]
    MissingAccessToken,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Authorization denied: {error}, description: {description:?}")]
    AuthorizationDenied {
        error: String,
        description: Option<String>,
    },

    #[error("Timed out waiting for the authorization callback")]
    CallbackTimeout,

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OAuthError {
    /// Whether this error was raised by a precondition check, before any
    /// request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OAuthError::MissingClientCredentials(_)
                | OAuthError::MissingCallbackUrl
                | OAuthError::InvalidCallbackUrl(_)
                | OAuthError::MissingAuthorizationCode
                | OAuthError::MissingRefreshToken
                | OAuthError::MissingAccessToken
        )
    }
}

pub type Result<T> = std::result::Result<T, OAuthError>;
