//! Unverified access-token claim extraction (§4.4).
//!
//! The access token's signature is never checked here -- that's the upstream
//! gateway's job (§1 non-goals). We only need `aud` (presence/shape) and
//! `cnf.jkt` (the thumbprint this request is bound to).

use serde_json::Value;

use crate::error::ValidationError;

#[derive(Debug)]
pub struct AccessTokenClaims {
    pub jkt: String,
}

pub fn parse_and_validate(token: &str) -> Result<AccessTokenClaims, ValidationError> {
    let data = jsonwebtoken::dangerous::insecure_decode::<Value>(token)
        .map_err(|_| ValidationError::TokenParseError)?;
    let claims = data.claims;

    validate_audience(&claims)?;
    let jkt = extract_jkt(&claims)?;

    Ok(AccessTokenClaims { jkt })
}

fn validate_audience(claims: &Value) -> Result<(), ValidationError> {
    match claims.get("aud") {
        None => Err(ValidationError::AudienceError {
            reason: "missing audience claim",
        }),
        Some(Value::String(s)) if !s.is_empty() => Ok(()),
        Some(Value::String(_)) => Err(ValidationError::AudienceError {
            reason: "empty audience claim",
        }),
        Some(Value::Array(items)) if !items.is_empty() && items.iter().all(|v| v.is_string()) => {
            Ok(())
        }
        Some(Value::Array(items)) if items.is_empty() => Err(ValidationError::AudienceError {
            reason: "empty audience claim array",
        }),
        Some(_) => Err(ValidationError::AudienceError {
            reason: "invalid audience claim format",
        }),
    }
}

fn extract_jkt(claims: &Value) -> Result<String, ValidationError> {
    let cnf = claims
        .get("cnf")
        .and_then(Value::as_object)
        .ok_or(ValidationError::ConfirmationError {
            reason: "missing cnf claim",
        })?;

    cnf.get("jkt")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ValidationError::ConfirmationError {
            reason: "missing jkt claim",
        })
}
