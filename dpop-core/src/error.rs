use thiserror::Error;

/// Failures around loading, generating, or exporting EC P-256 key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read or write key file: {0}")]
    Io(#[from] std::io::Error),

    #[error("key file is not a valid SEC1 EC P-256 private key: {0}")]
    Format(String),

    #[error("failed to derive a signing key from the loaded private key: {0}")]
    Encoding(String),

    #[error("failed to export public key: {0}")]
    Export(String),
}
