//! Hook dispatch (§4.4): branches on `hook_name` and implements the header
//! rewrite / validation behavior for each of `PreAuthCheck`, `PostKeyAuth`,
//! and the consolidated `DPoPCheck`.

use crate::access_token;
use crate::error::ValidationError;
use crate::model::{find_header, HookRequest, HookResponse};
use crate::proof;

const HEADER_VARIANTS: [&str; 3] = ["DPoP", "dpop", "Dpop"];

fn find_dpop_header(req: &HookRequest) -> Option<&str> {
    HEADER_VARIANTS
        .iter()
        .find_map(|name| find_header(&req.headers, name))
}

/// Route a hook object to the handler named by `hook_name`. Unknown hook
/// names pass the request through unchanged (matching the reference
/// gateway's behavior of logging a warning and not touching the request).
pub fn handle(req: &HookRequest) -> HookResponse {
    match req.hook_name.as_str() {
        "PreAuthCheck" => pre_auth_check(req),
        "PostKeyAuth" => post_key_auth(req),
        "DPoPCheck" => dpop_check(req),
        other => {
            tracing::warn!(hook = other, "unrecognized hook name, passing through");
            HookResponse::default()
        }
    }
}

/// Rewrite a `DPoP <token>` Authorization header into `Bearer <token>` so
/// downstream key auth sees a scheme it understands. Does not verify the
/// proof itself -- that happens in `PostKeyAuth`/`DPoPCheck`.
fn pre_auth_check(req: &HookRequest) -> HookResponse {
    let Some(auth) = find_header(&req.headers, "Authorization") else {
        return HookResponse::error_401(ValidationError::HeaderMissing { name: "Authorization" }.message());
    };
    if find_dpop_header(req).is_none() {
        return HookResponse::error_401(ValidationError::HeaderMissing { name: "DPoP" }.message());
    }

    if let Some(token) = auth.strip_prefix("DPoP ") {
        let mut response = HookResponse::default();
        response
            .set_headers
            .insert("Authorization".to_string(), format!("Bearer {token}"));
        response
    } else if auth.starts_with("Bearer ") {
        HookResponse::default()
    } else {
        HookResponse::error_401(ValidationError::HeaderMalformed.message())
    }
}

/// Full verification pass: access token claims, then DPoP proof, binding
/// one to the other via the thumbprint. On success strips the now-redundant
/// `DPoP`/`Authorization` headers and signals success to downstream
/// middleware with `X-Foo: Bar`. Expects `PreAuthCheck` to have already
/// rewritten the scheme to `Bearer`.
fn post_key_auth(req: &HookRequest) -> HookResponse {
    let Some(auth) = find_header(&req.headers, "Authorization") else {
        return HookResponse::error_401(ValidationError::HeaderMissing { name: "Authorization" }.message());
    };
    let Some(token) = auth.strip_prefix("Bearer ") else {
        return HookResponse::error_401(ValidationError::HeaderMalformed.message());
    };

    match verify_token(req, token) {
        Ok(()) => {
            let mut response = HookResponse::default();
            response
                .set_headers
                .insert("X-Foo".to_string(), "Bar".to_string());
            response.delete_headers.push("DPoP".to_string());
            response.delete_headers.push("Authorization".to_string());
            response
        }
        Err(err) => HookResponse::error_401(err.message()),
    }
}

/// Single-pass variant combining the header presence/rewrite check and the
/// full proof verification. Unlike `PostKeyAuth`, there is no prior
/// `PreAuthCheck` stage to have rewritten the scheme, so this accepts the
/// canonical `DPoP <token>` Authorization header directly (as well as
/// `Bearer <token>`, for parity with `PostKeyAuth`) and performs the same
/// `Bearer` rewrite on success. `X-Foo` is set on success; only the `DPoP`
/// header is removed, since there's no separate key-auth stage downstream
/// left to consume `Authorization`.
fn dpop_check(req: &HookRequest) -> HookResponse {
    let Some(auth) = find_header(&req.headers, "Authorization") else {
        return HookResponse::error_401(ValidationError::HeaderMissing { name: "Authorization" }.message());
    };
    let (token, was_dpop_scheme) = match extract_token_accepting_dpop(auth) {
        Ok(pair) => pair,
        Err(err) => return HookResponse::error_401(err.message()),
    };

    match verify_token(req, token) {
        Ok(()) => {
            let mut response = HookResponse::default();
            if was_dpop_scheme {
                response
                    .set_headers
                    .insert("Authorization".to_string(), format!("Bearer {token}"));
            }
            response
                .set_headers
                .insert("X-Foo".to_string(), "Bar".to_string());
            response.delete_headers.push("DPoP".to_string());
            response
        }
        Err(err) => HookResponse::error_401(err.message()),
    }
}

/// Extract the bearer token from an `Authorization` header that may carry
/// either the canonical `DPoP` scheme or an already-rewritten `Bearer`
/// scheme. Returns whether the `DPoP` scheme was seen, so callers can decide
/// whether a rewrite is still owed downstream.
fn extract_token_accepting_dpop(auth: &str) -> Result<(&str, bool), ValidationError> {
    if let Some(token) = auth.strip_prefix("DPoP ") {
        Ok((token, true))
    } else if let Some(token) = auth.strip_prefix("Bearer ") {
        Ok((token, false))
    } else {
        Err(ValidationError::HeaderMalformed)
    }
}

fn verify_token(req: &HookRequest, token: &str) -> Result<(), ValidationError> {
    let proof_value = find_dpop_header(req).ok_or(ValidationError::HeaderMissing { name: "DPoP" })?;

    let access_token = access_token::parse_and_validate(token)?;
    proof::verify(proof_value, &req.method, &req.url, &access_token.jkt)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpop_core::KeyPair;
    use jsonwebtoken::jwk::ThumbprintHash;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;
    use std::collections::HashMap;

    fn access_token(jkt: &str, aud: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &json!({ "aud": aud, "cnf": { "jkt": jkt } }),
            &EncodingKey::from_secret(b"irrelevant"),
        )
        .unwrap()
    }

    fn dpop_proof(key: &KeyPair, htm: &str, htu: &str) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("dpop+jwt".to_string());
        header.jwk = Some(key.public_jwk());
        let claims = json!({ "htm": htm, "htu": htu, "iat": 1_700_000_000, "jti": "abc" });
        encode(&header, &claims, key.encoding_key()).unwrap()
    }

    #[test]
    fn pre_auth_check_rejects_missing_authorization() {
        let req = HookRequest {
            hook_name: "PreAuthCheck".to_string(),
            headers: HashMap::new(),
            method: "GET".to_string(),
            url: "/x".to_string(),
        };
        let response = handle(&req);
        let overrides = response.return_overrides.unwrap();
        assert_eq!(overrides.response_code, 401);
    }

    #[test]
    fn pre_auth_check_rewrites_dpop_scheme_to_bearer() {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "DPoP sometoken".to_string());
        headers.insert("DPoP".to_string(), "proof-jwt".to_string());
        let req = HookRequest {
            hook_name: "PreAuthCheck".to_string(),
            headers,
            method: "GET".to_string(),
            url: "/x".to_string(),
        };
        let response = handle(&req);
        assert_eq!(
            response.set_headers.get("Authorization").unwrap(),
            "Bearer sometoken"
        );
    }

    #[test]
    fn pre_auth_check_rejects_non_bearer_non_dpop_scheme() {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Basic abc".to_string());
        headers.insert("DPoP".to_string(), "proof-jwt".to_string());
        let req = HookRequest {
            hook_name: "PreAuthCheck".to_string(),
            headers,
            method: "GET".to_string(),
            url: "/x".to_string(),
        };
        let response = handle(&req);
        assert_eq!(response.return_overrides.unwrap().response_code, 401);
    }

    #[test]
    fn post_key_auth_happy_path_sets_x_foo_and_deletes_headers() {
        let key = KeyPair::generate().unwrap();
        let jkt = key.public_jwk().thumbprint(ThumbprintHash::SHA256);
        let token = access_token(&jkt, "https://api.example.com");
        let proof = dpop_proof(&key, "POST", "/payments/create");

        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        headers.insert("DPoP".to_string(), proof);
        let req = HookRequest {
            hook_name: "PostKeyAuth".to_string(),
            headers,
            method: "POST".to_string(),
            url: "/payments/create".to_string(),
        };

        let response = handle(&req);
        assert!(response.return_overrides.is_none());
        assert_eq!(response.set_headers.get("X-Foo").unwrap(), "Bar");
        assert!(response.delete_headers.contains(&"DPoP".to_string()));
        assert!(response.delete_headers.contains(&"Authorization".to_string()));
    }

    #[test]
    fn post_key_auth_rejects_jkt_mismatch() {
        let key = KeyPair::generate().unwrap();
        let other = KeyPair::generate().unwrap();
        let jkt = other.public_jwk().thumbprint(ThumbprintHash::SHA256);
        let token = access_token(&jkt, "https://api.example.com");
        let proof = dpop_proof(&key, "POST", "/payments/create");

        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        headers.insert("DPoP".to_string(), proof);
        let req = HookRequest {
            hook_name: "PostKeyAuth".to_string(),
            headers,
            method: "POST".to_string(),
            url: "/payments/create".to_string(),
        };

        let response = handle(&req);
        assert_eq!(response.return_overrides.unwrap().response_code, 401);
    }

    #[test]
    fn dpop_check_accepts_dpop_scheme_and_rewrites_to_bearer() {
        let key = KeyPair::generate().unwrap();
        let jkt = key.public_jwk().thumbprint(ThumbprintHash::SHA256);
        let token = access_token(&jkt, "https://api.example.com");
        let proof = dpop_proof(&key, "POST", "/payments/create");

        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("DPoP {token}"));
        headers.insert("DPoP".to_string(), proof);
        let req = HookRequest {
            hook_name: "DPoPCheck".to_string(),
            headers,
            method: "POST".to_string(),
            url: "/payments/create".to_string(),
        };

        let response = handle(&req);
        assert!(response.return_overrides.is_none());
        assert_eq!(
            response.set_headers.get("Authorization").unwrap(),
            &format!("Bearer {token}")
        );
        assert_eq!(response.set_headers.get("X-Foo").unwrap(), "Bar");
        assert!(response.delete_headers.contains(&"DPoP".to_string()));
        assert!(!response.delete_headers.contains(&"Authorization".to_string()));
    }

    #[test]
    fn dpop_check_also_accepts_already_rewritten_bearer_scheme() {
        let key = KeyPair::generate().unwrap();
        let jkt = key.public_jwk().thumbprint(ThumbprintHash::SHA256);
        let token = access_token(&jkt, "https://api.example.com");
        let proof = dpop_proof(&key, "POST", "/payments/create");

        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        headers.insert("DPoP".to_string(), proof);
        let req = HookRequest {
            hook_name: "DPoPCheck".to_string(),
            headers,
            method: "POST".to_string(),
            url: "/payments/create".to_string(),
        };

        let response = handle(&req);
        assert!(response.return_overrides.is_none());
        assert!(!response.set_headers.contains_key("Authorization"));
        assert_eq!(response.set_headers.get("X-Foo").unwrap(), "Bar");
    }

    #[test]
    fn unknown_hook_passes_through() {
        let req = HookRequest {
            hook_name: "SomethingElse".to_string(),
            headers: HashMap::new(),
            method: "GET".to_string(),
            url: "/x".to_string(),
        };
        let response = handle(&req);
        assert!(response.return_overrides.is_none());
        assert!(response.set_headers.is_empty());
    }
}
