//! Background liveness sweep.
//!
//! Heartbeats mark devices online; this loop is the only thing that marks
//! them offline again. Every pass lists the devices currently online and
//! flips those whose last heartbeat is older than the threshold.
//!
//! "Online" is a liveness hint, not a lock: a device that went silent may
//! stay marked online for up to threshold + sweep interval. The sweep is a
//! batch of ordinary per-record updates, never a transaction across
//! devices, so it cannot starve concurrent heartbeat handling.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::trust::TrustStore;
use crate::Clock;

/// Sweep scheduling parameters.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// Time between passes.
    pub interval: Duration,
    /// Heartbeat age beyond which a device is marked offline.
    pub offline_after: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            offline_after: Duration::from_secs(60),
        }
    }
}

/// Runs one sweep pass and returns how many devices were marked offline.
///
/// Storage failures are logged and skipped; the next pass retries.
pub fn sweep_once(store: &dyn TrustStore, now: DateTime<Utc>, offline_after: Duration) -> usize {
    let devices = match store.list_online() {
        Ok(devices) => devices,
        Err(err) => {
            error!(error = %err, "liveness sweep could not list devices");
            return 0;
        }
    };

    let mut evicted = 0;
    for device in devices {
        let age = now.signed_duration_since(device.last_seen).num_seconds();
        if age <= offline_after.as_secs() as i64 {
            continue;
        }
        warn!(uuid = %device.uuid, age_secs = age, "device stopped reporting, marking offline");
        match store.set_online(&device.uuid, false) {
            Ok(()) => evicted += 1,
            Err(err) => error!(uuid = %device.uuid, error = %err, "failed to mark device offline"),
        }
    }
    evicted
}

/// Drives [`sweep_once`] on a fixed interval until the task is dropped.
pub async fn run(store: Arc<dyn TrustStore>, clock: Clock, config: SweepConfig) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    debug!(
        interval_secs = config.interval.as_secs(),
        offline_after_secs = config.offline_after.as_secs(),
        "liveness sweeper started"
    );
    loop {
        ticker.tick().await;
        sweep_once(store.as_ref(), (clock)(), config.offline_after);
    }
}
