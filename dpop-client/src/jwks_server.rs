//! JWKS HTTP server (§4.3): serves the client's public key at
//! `/.well-known/jwks.json` so the identity provider can verify
//! client-assertion JWTs and DPoP proofs against it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use dpop_core::KeyPair;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::ClientError;

#[derive(Default)]
pub struct JwksServer {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl JwksServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start serving `GET /.well-known/jwks.json` on `port`. Rejects if
    /// already started; call [`JwksServer::stop`] first to restart.
    pub async fn start(&self, port: u16, key: Arc<KeyPair>) -> Result<(), ClientError> {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return Err(ClientError::ConfigError(
                "JWKS server is already running".to_string(),
            ));
        }

        let app = Router::new().route(
            "/.well-known/jwks.json",
            get(move || jwks_body(key.clone())),
        );

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        *handle = Some(tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, app).await {
                tracing::error!(%error, "JWKS server exited unexpectedly");
            }
        }));

        Ok(())
    }

    /// Stop the server if running. Safe to call when already stopped.
    pub async fn stop(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        }
    }
}

async fn jwks_body(key: Arc<KeyPair>) -> (
    [(&'static str, &'static str); 2],
    Json<Value>,
) {
    let jwk = key.public_jwk();
    let body = json!({ "keys": [jwk] });
    (
        [
            ("content-type", "application/json"),
            ("access-control-allow-origin", "*"),
        ],
        Json(body),
    )
}
