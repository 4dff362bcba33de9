//! `htu` normalization policy (§4.4): path-only comparison.
//!
//! This is deliberately weaker than RFC 9449 (which wants scheme+authority+
//! path) so that proxy rewrites between the client and this validator don't
//! break proofs. Known deviation, kept for interop with the reference
//! gateway -- see the design notes.

/// Reduce a request URL to the path component `htu` is compared against.
/// If the URL has no scheme (`"://"` absent) it is already path-only and is
/// returned as-is.
pub fn path_only(url: &str) -> String {
    if url.contains("://") {
        match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url.to_string(),
        }
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_host_and_query() {
        assert_eq!(
            path_only("https://api.example.com/payments/anything?x=1"),
            "/payments/anything"
        );
    }

    #[test]
    fn leaves_bare_paths_untouched() {
        assert_eq!(path_only("/payments/anything"), "/payments/anything");
    }
}
