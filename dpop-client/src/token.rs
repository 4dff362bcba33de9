//! Proof generator and token cache (§4.2): client-assertion JWTs, per-request
//! DPoP proofs, and `client_credentials` token acquisition with a
//! single-flight refresh cache.

use std::sync::Arc;

use dpop_core::{ClientAssertionClaims, DpopProofClaims, KeyPair};
use jsonwebtoken::{encode, Algorithm, Header};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expiry: i64,
}

#[derive(Deserialize)]
struct WellKnown {
    token_endpoint: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Builds DPoP proofs and client assertions, and maintains the single
/// cached access token for this process. The mutex is held across the
/// entire refresh so concurrent callers observe one network round trip.
pub struct TokenSource {
    key: Arc<KeyPair>,
    config: Config,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(key: Arc<KeyPair>, config: Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            key,
            config,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Build a signed DPoP proof JWT for `method`/`url`, each call producing
    /// a fresh `jti`/`iat` (and so a distinct signature).
    pub fn dpop_proof(&self, method: &str, url: &str, now: i64) -> Result<String, ClientError> {
        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("dpop+jwt".to_string());
        header.jwk = Some(self.key.public_jwk());

        let claims = DpopProofClaims::new(method, url, now);
        encode(&header, &claims, self.key.encoding_key()).map_err(ClientError::from)
    }

    fn client_assertion(&self, token_endpoint: &str, now: i64) -> Result<String, ClientError> {
        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("JWT".to_string());
        header.jwk = Some(self.key.public_jwk());

        let claims = ClientAssertionClaims::new(&self.config.client_id, token_endpoint, now);
        encode(&header, &claims, self.key.encoding_key()).map_err(ClientError::from)
    }

    /// Return a valid access token, using the cache if its expiry is still
    /// in the future, otherwise refreshing it (serialized by the mutex held
    /// across the whole call).
    pub async fn access_token(&self, now: i64) -> Result<String, ClientError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref()
            && token.expiry > now
        {
            tracing::debug!("token cache hit");
            return Ok(token.access_token.clone());
        }

        tracing::info!("token cache miss, refreshing");
        let fresh = self.fetch_token(now).await?;
        tracing::info!(expiry = fresh.expiry, "token refreshed");
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn fetch_token(&self, now: i64) -> Result<CachedToken, ClientError> {
        let well_known_url = self.config.well_known_url();
        let well_known: WellKnown = self
            .http
            .get(&well_known_url)
            .send()
            .await
            .map_err(|e| ClientError::DiscoveryError(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClientError::DiscoveryError(e.to_string()))?
            .json()
            .await
            .map_err(|e| ClientError::DiscoveryError(e.to_string()))?;

        let assertion = self.client_assertion(&well_known.token_endpoint, now)?;
        let proof = self.dpop_proof("POST", &well_known.token_endpoint, now)?;

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", &self.config.client_id),
            (
                "client_assertion_type",
                "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
            ),
            ("client_assertion", &assertion),
            ("scope", "openid"),
            ("jwks_uri", &self.config.jwks_url()),
        ];

        let response = self
            .http
            .post(&well_known.token_endpoint)
            .header("DPoP", proof)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "token endpoint rejected request");
            return Err(ClientError::TokenEndpointError {
                status: status.as_u16(),
                body,
            });
        }

        let body: TokenResponse = response.json().await?;
        let access_token = body.access_token.ok_or(ClientError::TokenResponseError)?;
        let expiry = now + body.expires_in.unwrap_or(300);

        Ok(CachedToken {
            access_token,
            expiry,
        })
    }
}

#[cfg(test)]
impl TokenSource {
    /// Build a `TokenSource` with its cache pre-seeded, so tests elsewhere
    /// in the crate can exercise callers of `access_token` without standing
    /// up a mock identity provider.
    pub(crate) fn with_cached_token_for_test(
        key: Arc<KeyPair>,
        config: Config,
        token: CachedToken,
    ) -> Result<Self, ClientError> {
        let source = Self::new(key, config)?;
        *source.cached.try_lock().expect("uncontended in tests") = Some(token);
        Ok(source)
    }
}
