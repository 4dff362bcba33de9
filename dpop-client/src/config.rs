//! Process configuration (§4.7/§6): `.env` + environment, fail-fast.

use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub auth_server_url: String,
    pub api_server_url: String,
    pub jwks_server_port: u16,
    pub realm_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ClientError> {
        let _ = dotenvy::dotenv();

        let client_id = env_or_default("CLIENT_ID", "my-tpp");
        let auth_server_url = std::env::var("AUTH_SERVER_URL")
            .or_else(|_| std::env::var("KEYCLOAK_URL"))
            .unwrap_or_else(|_| "http://localhost:8081".to_string());
        let api_server_url = std::env::var("API_SERVER_URL")
            .or_else(|_| std::env::var("TYK_GATEWAY_URL"))
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let realm_name = env_or_default("REALM_NAME", "fapi-demo");

        let jwks_server_port = match std::env::var("JWKS_SERVER_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| ClientError::ConfigError(format!("invalid JWKS_SERVER_PORT: {value}")))?,
            Err(_) => 8082,
        };

        Ok(Self {
            client_id,
            auth_server_url,
            api_server_url,
            jwks_server_port,
            realm_name,
        })
    }

    pub fn well_known_url(&self) -> String {
        format!(
            "{}/realms/{}/.well-known/openid-configuration",
            self.auth_server_url.trim_end_matches('/'),
            self.realm_name
        )
    }

    pub fn jwks_url(&self) -> String {
        format!(
            "http://localhost:{}/.well-known/jwks.json",
            self.jwks_server_port
        )
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
