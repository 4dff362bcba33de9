//! Shared protocol types: the JWT claim shapes produced by the generator and
//! consumed by the validator.
//!
//! `aud` is modeled as a tagged variant over {string, array-of-string} rather
//! than a flat string, matching its intrinsic JSON shape (RFC 7519 §4.1.3).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The `aud` claim: either a single audience string or a non-empty array of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// True if this audience carries at least one non-empty string.
    pub fn is_present_and_non_empty(&self) -> bool {
        match self {
            Audience::Single(s) => !s.is_empty(),
            Audience::Many(items) => !items.is_empty() && items.iter().all(|s| !s.is_empty()),
        }
    }
}

impl From<String> for Audience {
    fn from(value: String) -> Self {
        Audience::Single(value)
    }
}

/// Claims of a DPoP proof JWT (RFC 9449 §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DpopProofClaims {
    /// HTTP method, uppercase.
    pub htm: String,
    /// Target URL, normalized per the policy in use (see the validator crate).
    pub htu: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Unique proof identifier.
    pub jti: String,
}

impl DpopProofClaims {
    pub fn new(method: &str, htu: impl Into<String>, now: i64) -> Self {
        Self {
            htm: method.to_ascii_uppercase(),
            htu: htu.into(),
            iat: now,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Claims of a private-key JWT client assertion (RFC 7523).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl ClientAssertionClaims {
    /// Lifetime of a client assertion, per §3: `exp = iat + 300`.
    pub const LIFETIME_SECONDS: i64 = 300;

    pub fn new(client_id: impl Into<String>, token_endpoint: impl Into<String>, now: i64) -> Self {
        let client_id = client_id.into();
        Self {
            iss: client_id.clone(),
            sub: client_id,
            aud: Audience::Single(token_endpoint.into()),
            iat: now,
            exp: now + Self::LIFETIME_SECONDS,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// The `cnf` confirmation claim binding an access token to a JWK thumbprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationClaim {
    pub jkt: String,
}
