//! Persistent device trust store.
//!
//! Every door controller the gateway will talk to has a record here:
//! identity UUID, the hotel it belongs to, its public key, and its
//! heartbeat-derived liveness state. A device without a record cannot
//! authenticate — every protocol request for it fails closed.
//!
//! Records are provisioned out of band (see the daemon's `--provision`
//! flag) and mutated only through [`TrustStore::touch`] and
//! [`TrustStore::set_online`].
//!
//! # Concurrency
//!
//! The SQLite connection sits behind a mutex; statements are single-row
//! and short, which gives the per-record atomicity the dispatcher and the
//! sweeper rely on. Racing touches for the same device are last-writer-
//! wins except for `last_seen`, whose monotonicity is enforced in SQL: an
//! earlier timestamp never rolls the stored value back.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;


/// A known door controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Stable identity, assigned when the controller is provisioned.
    pub uuid: String,
    /// Hotel this controller operates doors for.
    pub hotel_id: String,
    /// SubjectPublicKeyInfo DER of the controller's RSA public key.
    pub public_key: Vec<u8>,
    /// Last accepted heartbeat.
    pub last_seen: DateTime<Utc>,
    /// Whether the controller is currently considered alive.
    pub online: bool,
}

/// Errors from trust store operations.
#[derive(Debug, Error)]
pub enum TrustStoreError {
    /// No record exists for the given UUID.
    #[error("unknown device {uuid}")]
    UnknownDevice {
        /// The UUID that failed to resolve.
        uuid: String,
    },

    /// The underlying storage failed.
    #[error("trust store storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The connection lock was poisoned by a panicking writer.
    #[error("trust store lock poisoned")]
    Poisoned,
}

/// Device trust store interface.
///
/// Object-safe so daemons and tests can swap the backing storage.
pub trait TrustStore: Send + Sync {
    /// Inserts or re-provisions a device record.
    ///
    /// Re-provisioning an existing UUID replaces its hotel assignment and
    /// public key (key rotation) and leaves its liveness state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::Storage`] on storage failure.
    fn register(&self, device: &Device) -> Result<(), TrustStoreError>;

    /// Resolves a device by UUID.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::UnknownDevice`] when no record exists.
    fn lookup(&self, uuid: &str) -> Result<Device, TrustStoreError>;

    /// Marks the device online and raises `last_seen` to `now`.
    ///
    /// Monotonic: a `now` earlier than the stored timestamp marks the
    /// device online but leaves `last_seen` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::UnknownDevice`] when no record exists.
    fn touch(&self, uuid: &str, now: DateTime<Utc>) -> Result<(), TrustStoreError>;

    /// Sets the online flag.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::UnknownDevice`] when no record exists.
    fn set_online(&self, uuid: &str, online: bool) -> Result<(), TrustStoreError>;

    /// All devices currently marked online.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::Storage`] on storage failure.
    fn list_online(&self) -> Result<Vec<Device>, TrustStoreError>;
}

/// SQLite-backed [`TrustStore`].
#[derive(Debug)]
pub struct SqliteTrustStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTrustStore {
    /// Opens (and if necessary creates) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::Storage`] when the database cannot be
    /// opened or the schema cannot be created.
    pub fn open(path: &Path) -> Result<Self, TrustStoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory store, for tests and local experimentation.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::Storage`] when the schema cannot be
    /// created.
    pub fn open_in_memory() -> Result<Self, TrustStoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, TrustStoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS devices (
                uuid       TEXT PRIMARY KEY,
                hotel_id   TEXT NOT NULL,
                public_key BLOB NOT NULL,
                last_seen  INTEGER NOT NULL DEFAULT 0,
                online     INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, TrustStoreError> {
        self.conn.lock().map_err(|_| TrustStoreError::Poisoned)
    }
}

fn row_to_device(row: &rusqlite::Row<'_>) -> rusqlite::Result<Device> {
    let last_seen: i64 = row.get(3)?;
    Ok(Device {
        uuid: row.get(0)?,
        hotel_id: row.get(1)?,
        public_key: row.get(2)?,
        last_seen: DateTime::from_timestamp(last_seen, 0).unwrap_or(DateTime::UNIX_EPOCH),
        online: row.get::<_, i64>(4)? != 0,
    })
}

impl TrustStore for SqliteTrustStore {
    fn register(&self, device: &Device) -> Result<(), TrustStoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO devices (uuid, hotel_id, public_key, last_seen, online)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(uuid) DO UPDATE SET
                 hotel_id = excluded.hotel_id,
                 public_key = excluded.public_key",
            params![
                device.uuid,
                device.hotel_id,
                device.public_key,
                device.last_seen.timestamp(),
                i64::from(device.online),
            ],
        )?;
        Ok(())
    }

    fn lookup(&self, uuid: &str) -> Result<Device, TrustStoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT uuid, hotel_id, public_key, last_seen, online
             FROM devices WHERE uuid = ?1",
            params![uuid],
            row_to_device,
        )
        .optional()?
        .ok_or_else(|| TrustStoreError::UnknownDevice {
            uuid: uuid.to_string(),
        })
    }

    fn touch(&self, uuid: &str, now: DateTime<Utc>) -> Result<(), TrustStoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE devices
             SET online = 1, last_seen = MAX(last_seen, ?2)
             WHERE uuid = ?1",
            params![uuid, now.timestamp()],
        )?;
        if updated == 0 {
            return Err(TrustStoreError::UnknownDevice {
                uuid: uuid.to_string(),
            });
        }
        Ok(())
    }

    fn set_online(&self, uuid: &str, online: bool) -> Result<(), TrustStoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE devices SET online = ?2 WHERE uuid = ?1",
            params![uuid, i64::from(online)],
        )?;
        if updated == 0 {
            return Err(TrustStoreError::UnknownDevice {
                uuid: uuid.to_string(),
            });
        }
        Ok(())
    }

    fn list_online(&self) -> Result<Vec<Device>, TrustStoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT uuid, hotel_id, public_key, last_seen, online
             FROM devices WHERE online = 1",
        )?;
        let devices = stmt
            .query_map([], row_to_device)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(devices)
    }
}
