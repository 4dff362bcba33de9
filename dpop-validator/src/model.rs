//! Domain projection of the hook object (§3), independent of the protobuf
//! wire types generated from `proto/dpop.proto`. Keeping validation logic
//! free of `tonic`/`prost` types makes it directly unit-testable.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct HookRequest {
    pub hook_name: String,
    pub headers: HashMap<String, String>,
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct HookResponse {
    pub set_headers: HashMap<String, String>,
    pub delete_headers: Vec<String>,
    pub return_overrides: Option<ReturnOverrides>,
}

#[derive(Debug, Clone)]
pub struct ReturnOverrides {
    pub response_code: i32,
    pub response_error: String,
    pub headers: HashMap<String, String>,
}

impl HookResponse {
    /// Build the standard 401 error response shape (§4.4/§7): JSON content
    /// type, the failure message as the body, no header mutations.
    pub fn error_401(message: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            set_headers: HashMap::new(),
            delete_headers: Vec::new(),
            return_overrides: Some(ReturnOverrides {
                response_code: 401,
                response_error: message.into(),
                headers,
            }),
        }
    }
}

/// Case-insensitive header lookup, tolerating hosts that don't canonicalize
/// casing (the reference probes `{DPoP, dpop, Dpop}` explicitly; this
/// generalizes that to any casing).
pub fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
