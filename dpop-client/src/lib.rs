pub mod config;
pub mod error;
pub mod jwks_server;
pub mod token;
pub mod transport;
