use thiserror::Error;

/// The validator's error taxonomy (see design doc §7). Every variant maps to
/// a 401 response; none of these ever reach the gRPC transport as a `Status`
/// error, they are always encoded into `ReturnOverrides` by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{name} header is required")]
    HeaderMissing { name: &'static str },

    #[error("Invalid Authorization header format")]
    HeaderMalformed,

    #[error("Invalid access token: malformed token")]
    TokenParseError,

    #[error("{reason}")]
    AudienceError { reason: &'static str },

    #[error("Invalid access token: {reason}")]
    ConfirmationError { reason: &'static str },

    #[error("invalid DPoP proof: malformed token")]
    ProofParseError,

    #[error("invalid {claim} claim: expected {expected}, got {got}")]
    ProofClaimError {
        claim: &'static str,
        expected: String,
        got: String,
    },

    #[error("missing or invalid jwk header")]
    ProofJwkError,

    #[error("JKT mismatch")]
    ThumbprintMismatch { expected: String, computed: String },

    #[error("invalid DPoP proof: signature verification failed")]
    SignatureInvalid,
}

impl ValidationError {
    /// The 401 JSON body message, matching the literal strings in §7/§8.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
