//! DPoP proof JWT verification (§4.4): header/jwk extraction, ES256
//! signature verification, claim checks, and the thumbprint-binding compare
//! against the access token's `cnf.jkt`.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{Jwk, ThumbprintHash};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde_json::Value;

use crate::error::ValidationError;
use crate::normalize::path_only;

#[derive(Debug)]
pub struct VerifiedProof {
    pub jti: String,
}

/// Verify `proof` (the raw `DPoP` header value) against the request's method
/// and URL and the access token's bound thumbprint.
///
/// Order of checks follows §5: header/jwk extraction, thumbprint-binding
/// compare, signature verification, then claim content checks. Thumbprint
/// is checked before the signature so that an attacker who embeds a
/// victim's public key (wrong binding) is rejected without us needing to
/// attempt a verification that would fail for an unrelated reason; an
/// attacker who embeds their own key to pass the thumbprint check is then
/// caught by signature verification, since they don't hold the bound key.
pub fn verify(
    proof: &str,
    method: &str,
    request_url: &str,
    expected_jkt: &str,
) -> Result<VerifiedProof, ValidationError> {
    let header = decode_header(proof).map_err(|_| ValidationError::ProofParseError)?;

    match header.typ.as_deref() {
        Some(typ) if typ.eq_ignore_ascii_case("dpop+jwt") => {}
        _ => return Err(ValidationError::ProofParseError),
    }

    if header.alg != Algorithm::ES256 {
        return Err(ValidationError::ProofParseError);
    }

    let jwk: Jwk = header.jwk.ok_or(ValidationError::ProofJwkError)?;

    let computed = jwk.thumbprint(ThumbprintHash::SHA256);
    if computed != expected_jkt {
        return Err(ValidationError::ThumbprintMismatch {
            expected: expected_jkt.to_string(),
            computed,
        });
    }

    let decoding_key =
        DecodingKey::from_jwk(&jwk).map_err(|_| ValidationError::ProofJwkError)?;

    let mut validation = Validation::new(Algorithm::ES256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Value>(proof, &decoding_key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::InvalidSignature => ValidationError::SignatureInvalid,
            _ => ValidationError::ProofParseError,
        }
    })?;
    let claims = token_data.claims;

    let htm = require_str_claim(&claims, "htm")?;
    if !htm.eq_ignore_ascii_case(method) {
        return Err(ValidationError::ProofClaimError {
            claim: "htm",
            expected: method.to_string(),
            got: htm,
        });
    }

    let htu = require_str_claim(&claims, "htu")?;
    let expected_htu = path_only(request_url);
    if htu != expected_htu {
        return Err(ValidationError::ProofClaimError {
            claim: "htu",
            expected: expected_htu,
            got: htu,
        });
    }

    let jti = require_str_claim(&claims, "jti")?;

    require_number_claim(&claims, "iat")?;

    Ok(VerifiedProof { jti })
}

fn require_str_claim(claims: &Value, name: &'static str) -> Result<String, ValidationError> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ValidationError::ProofClaimError {
            claim: name,
            expected: "present string".to_string(),
            got: "missing".to_string(),
        })
}

fn require_number_claim(claims: &Value, name: &'static str) -> Result<(), ValidationError> {
    match claims.get(name) {
        Some(v) if v.is_number() => Ok(()),
        _ => Err(ValidationError::ProofClaimError {
            claim: name,
            expected: "present number".to_string(),
            got: "missing".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpop_core::KeyPair;
    use jsonwebtoken::{Header, encode};
    use jsonwebtoken::jwk::Jwk as JwtJwk;

    fn sign_proof(key: &KeyPair, htm: &str, htu: &str, jti: Option<&str>) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("dpop+jwt".to_string());
        header.jwk = Some(key.public_jwk());

        let mut claims = serde_json::json!({
            "htm": htm,
            "htu": htu,
            "iat": 1_700_000_000,
        });
        if let Some(jti) = jti {
            claims["jti"] = serde_json::json!(jti);
        }

        encode(&header, &claims, key.encoding_key()).unwrap()
    }

    #[test]
    fn round_trip_succeeds() {
        let key = KeyPair::generate().unwrap();
        let thumbprint = key.thumbprint();
        let proof = sign_proof(&key, "POST", "/payments/create", Some("jti-1"));

        let verified = verify(&proof, "POST", "/payments/create", &thumbprint).unwrap();
        assert_eq!(verified.jti, "jti-1");
    }

    #[test]
    fn url_path_only_match_ignores_query_and_host() {
        let key = KeyPair::generate().unwrap();
        let thumbprint = key.thumbprint();
        let proof = sign_proof(&key, "GET", "/payments/anything", Some("jti-2"));

        assert!(
            verify(
                &proof,
                "GET",
                "https://api.example.com/payments/anything?x=1",
                &thumbprint
            )
            .is_ok()
        );
    }

    #[test]
    fn method_mismatch_is_rejected() {
        let key = KeyPair::generate().unwrap();
        let thumbprint = key.thumbprint();
        let proof = sign_proof(&key, "GET", "/payments/create", Some("jti-3"));

        let err = verify(&proof, "POST", "/payments/create", &thumbprint).unwrap_err();
        assert!(matches!(err, ValidationError::ProofClaimError { claim: "htm", .. }));
    }

    #[test]
    fn thumbprint_mismatch_is_rejected_before_signature_check() {
        let key_a = KeyPair::generate().unwrap();
        let key_b = KeyPair::generate().unwrap();
        let proof = sign_proof(&key_a, "POST", "/payments/create", Some("jti-4"));

        let err = verify(&proof, "POST", "/payments/create", &key_b.thumbprint()).unwrap_err();
        assert!(matches!(err, ValidationError::ThumbprintMismatch { .. }));
    }

    #[test]
    fn forged_jwk_with_mismatched_signature_is_rejected() {
        // Attacker embeds the victim's public key (so the thumbprint check
        // passes) but signs with their own private key.
        let victim = KeyPair::generate().unwrap();
        let attacker = KeyPair::generate().unwrap();

        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("dpop+jwt".to_string());
        header.jwk = Some(victim.public_jwk());
        let claims = serde_json::json!({
            "htm": "POST",
            "htu": "/payments/create",
            "iat": 1_700_000_000,
            "jti": "jti-5",
        });
        let forged = encode(&header, &claims, attacker.encoding_key()).unwrap();

        let err = verify(&forged, "POST", "/payments/create", &victim.thumbprint()).unwrap_err();
        assert_eq!(err, ValidationError::SignatureInvalid);
    }

    #[test]
    fn missing_jwk_header_is_rejected() {
        let key = KeyPair::generate().unwrap();
        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("dpop+jwt".to_string());
        // no `jwk` set
        let claims = serde_json::json!({
            "htm": "GET", "htu": "/x", "iat": 1, "jti": "j",
        });
        let token = encode(&header, &claims, key.encoding_key()).unwrap();

        let err = verify(&token, "GET", "/x", &key.thumbprint()).unwrap_err();
        assert_eq!(err, ValidationError::ProofJwkError);
    }

    #[allow(dead_code)]
    fn _type_assert(_: JwtJwk) {}
}
