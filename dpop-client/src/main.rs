use std::panic;
use std::process;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use dpop_client::config::Config;
use dpop_client::error::ClientError;
use dpop_client::jwks_server::JwksServer;
use dpop_client::token::TokenSource;
use dpop_core::KeyPair;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,dpop_client=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");
        default_hook(info);
    }));
}

#[tokio::main]
async fn main() {
    init_tracing();
    init_panic_hook();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "fatal error during startup");
        process::exit(1);
    }
}

async fn run() -> Result<(), ClientError> {
    let config = Config::from_env()?;
    tracing::info!(client_id = %config.client_id, "starting DPoP client");

    let key = Arc::new(KeyPair::load_or_generate("private_key.pem")?);

    let jwks_server = Arc::new(JwksServer::new());
    jwks_server.start(config.jwks_server_port, key.clone()).await?;

    let tokens = Arc::new(TokenSource::new(key, config)?);

    let now = unix_now();
    match tokens.access_token(now).await {
        Ok(_) => tracing::info!("acquired initial access token"),
        Err(error) => tracing::error!(%error, "failed to acquire initial access token"),
    }

    shutdown_signal().await;
    jwks_server.stop().await;

    Ok(())
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_secs() as i64
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
