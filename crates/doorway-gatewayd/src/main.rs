//! doorway-gatewayd - Doorway device gateway daemon
//!
//! Serves the signed envelope endpoint door controllers poll, sweeps
//! device liveness in the background, and resolves pending unlock actions
//! against the external rooms service.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::Parser;
use doorway_core::crypto::Keypair;
use doorway_gatewayd::dispatch::Dispatcher;
use doorway_gatewayd::rooms::{HttpRoomsClient, RoomsApi};
use doorway_gatewayd::sweeper::{self, SweepConfig};
use doorway_gatewayd::trust::{Device, SqliteTrustStore, TrustStore};
use doorway_gatewayd::{server, system_clock};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::RsaPublicKey;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Doorway device gateway.
#[derive(Parser, Debug)]
#[command(name = "doorway-gatewayd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080", env = "DOORWAY_LISTEN")]
    listen: SocketAddr,

    /// Path to the device trust database (SQLite)
    #[arg(long, default_value = "doorway.db", env = "DOORWAY_DB")]
    db: PathBuf,

    /// Path to the gateway key pair (PKCS#8 PEM; generated on first boot)
    #[arg(long, default_value = "gateway-key.pem", env = "DOORWAY_KEY")]
    key: PathBuf,

    /// Base URL of the rooms service
    #[arg(long, default_value = "http://rooms", env = "DOORWAY_ROOMS_URL")]
    rooms_url: String,

    /// Seconds between liveness sweeps
    #[arg(long, default_value = "5", env = "DOORWAY_SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: u64,

    /// Heartbeat age in seconds beyond which a device is marked offline
    #[arg(long, default_value = "60", env = "DOORWAY_OFFLINE_AFTER_SECS")]
    offline_after_secs: u64,

    /// Timeout in seconds for rooms service calls
    #[arg(long, default_value = "10", env = "DOORWAY_UPSTREAM_TIMEOUT_SECS")]
    upstream_timeout_secs: u64,

    /// Provision a device record and exit: UUID,HOTEL_ID,PUBKEY_PEM_PATH
    #[arg(long, value_name = "UUID,HOTEL_ID,PUBKEY_PEM")]
    provision: Option<String>,

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

    let store = Arc::new(SqliteTrustStore::open(&args.db).context("open trust store")?);

    if let Some(spec) = args.provision.as_deref() {
        return provision(store.as_ref(), spec);
    }

    let keypair = Arc::new(Keypair::load_or_generate(&args.key).context("load gateway key")?);
    let rooms: Arc<dyn RoomsApi> = Arc::new(
        HttpRoomsClient::new(
            args.rooms_url.clone(),
            Duration::from_secs(args.upstream_timeout_secs),
        )
        .context("build rooms client")?,
    );

    let trust: Arc<dyn TrustStore> = store;
    let dispatcher = Arc::new(Dispatcher::new(
        trust.clone(),
        keypair,
        rooms,
        system_clock(),
    ));

    tokio::spawn(sweeper::run(
        trust,
        system_clock(),
        SweepConfig {
            interval: Duration::from_secs(args.sweep_interval_secs),
            offline_after: Duration::from_secs(args.offline_after_secs),
        },
    ));

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("bind {}", args.listen))?;
    info!(addr = %args.listen, rooms_url = %args.rooms_url, "gateway listening");

    axum::serve(listener, server::router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    Ok(())
}

/// Inserts a device record from a `UUID,HOTEL_ID,PUBKEY_PEM_PATH` spec.
fn provision(store: &SqliteTrustStore, spec: &str) -> Result<()> {
    let parts: Vec<&str> = spec.splitn(3, ',').collect();
    let [uuid, hotel_id, pem_path] = parts.as_slice() else {
        bail!("--provision takes UUID,HOTEL_ID,PUBKEY_PEM_PATH");
    };

    uuid::Uuid::parse_str(uuid).context("device UUID")?;
    let pem = std::fs::read_to_string(pem_path)
        .with_context(|| format!("read public key {pem_path}"))?;
    let public_key = RsaPublicKey::from_public_key_pem(&pem)
        .context("parse device public key")?
        .to_public_key_der()
        .context("encode device public key")?
        .into_vec();

    store.register(&Device {
        uuid: (*uuid).to_string(),
        hotel_id: (*hotel_id).to_string(),
        public_key,
        last_seen: DateTime::UNIX_EPOCH,
        online: false,
    })?;

    info!(%uuid, %hotel_id, "device provisioned");
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
