//! doorway-mqtt-authd - Doorway broker ACL front
//!
//! Serves the broker's auth delegation endpoints over the shared bus
//! credential secret.

use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use doorway_mqtt_authd::{router, AuthState};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Doorway broker ACL front.
#[derive(Parser, Debug)]
#[command(name = "doorway-mqtt-authd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8084", env = "DOORWAY_ACL_LISTEN")]
    listen: SocketAddr,

    /// Shared secret for verifying bus credentials
    #[arg(long, env = "DOORWAY_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "DOORWAY_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).context("invalid log level")?)
        .init();

    if args.jwt_secret.is_empty() {
        bail!("refusing to start with an empty credential secret");
    }

    let state = AuthState::new(args.jwt_secret.into_bytes());

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("bind {}", args.listen))?;
    info!(addr = %args.listen, "ACL front listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
