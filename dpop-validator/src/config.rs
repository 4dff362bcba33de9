//! Process configuration (§4.7): environment-driven, fail-fast.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid DPOP_VALIDATOR_ADDR: {0}")]
    InvalidAddr(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = std::env::var("DPOP_VALIDATOR_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5555".to_string());
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddr(addr))?;

        Ok(Self { addr })
    }
}
