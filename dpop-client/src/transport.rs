//! DPoP-aware HTTP transport (§4.3): wraps outbound requests with a fresh
//! DPoP proof and a `DPoP`-scheme `Authorization` header.

use std::sync::Arc;

use reqwest::Method;

use crate::error::ClientError;
use crate::token::TokenSource;

pub struct DpopTransport {
    http: reqwest::Client,
    tokens: Arc<TokenSource>,
}

impl DpopTransport {
    pub fn new(tokens: Arc<TokenSource>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { http, tokens })
    }

    /// Dispatch a request to `url` with method `method`, attaching a fresh
    /// DPoP proof and a `DPoP`-scheme Authorization header bound to the
    /// current access token.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        now: i64,
    ) -> Result<reqwest::Response, ClientError> {
        let access_token = self.tokens.access_token(now).await?;
        let proof = self.tokens.dpop_proof(method.as_str(), url, now)?;

        let response = self
            .http
            .request(method, url)
            .header("DPoP", proof)
            .header("Authorization", format!("DPoP {access_token}"))
            .send()
            .await?;

        Ok(response)
    }
}
