use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("key material error: {0}")]
    KeyFormatError(#[from] dpop_core::KeyError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("well-known discovery failed: {0}")]
    DiscoveryError(String),

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpointError { status: u16, body: String },

    #[error("token response missing access_token")]
    TokenResponseError,

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("failed to sign JWT: {0}")]
    SigningError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}
