//! HTTP client for the external rooms service.
//!
//! The rooms service owns all room state, including the `shouldOpen` flag
//! that drives unlock actions. The gateway only ever reads rooms and clears
//! that flag; everything else about the service is out of scope here.
//!
//! Responses follow the platform's JSON convention: every body carries an
//! `err` string, empty on success.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// A room as the rooms service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Room {
    /// Room id; unlock actions are keyed by it.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Hotel the room belongs to.
    #[serde(rename = "hotelId")]
    pub hotel_id: String,
    /// True while an unlock is pending for this room.
    #[serde(rename = "shouldOpen", default)]
    pub should_open: bool,
}

/// Errors from rooms service calls.
#[derive(Debug, Error)]
pub enum RoomsError {
    /// The request did not complete (connect failure, timeout, bad status).
    #[error("rooms service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-empty `err` field.
    #[error("rooms service error: {0}")]
    Upstream(String),
}

/// Read/mutate interface to the rooms service.
///
/// Behind a trait so the action engine and its tests do not depend on a
/// live service.
#[async_trait]
pub trait RoomsApi: Send + Sync {
    /// All rooms of a hotel.
    async fn rooms_by_hotel(&self, hotel_id: &str) -> Result<Vec<Room>, RoomsError>;

    /// A single room, or `None` when the id is unknown.
    async fn room(&self, room_id: &str) -> Result<Option<Room>, RoomsError>;

    /// Clears the room's `shouldOpen` flag after a successful unlock.
    async fn clear_should_open(&self, room_id: &str) -> Result<(), RoomsError>;
}

#[derive(Debug, Deserialize)]
struct RoomsBody {
    #[serde(default)]
    err: String,
    #[serde(default)]
    rooms: Vec<Room>,
}

#[derive(Debug, Deserialize)]
struct RoomBody {
    #[serde(default)]
    err: String,
    room: Option<Room>,
}

#[derive(Debug, Deserialize)]
struct AckBody {
    #[serde(default)]
    err: String,
}

/// [`RoomsApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRoomsClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRoomsClient {
    /// Builds a client for the service at `base_url` with a per-request
    /// timeout.
    ///
    /// Calls must never hang a gateway request: a slow rooms service
    /// surfaces as [`RoomsError::Transport`] once the timeout elapses.
    ///
    /// # Errors
    ///
    /// Returns [`RoomsError::Transport`] when the underlying client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RoomsError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

fn check_err(err: String) -> Result<(), RoomsError> {
    if err.is_empty() {
        Ok(())
    } else {
        Err(RoomsError::Upstream(err))
    }
}

#[async_trait]
impl RoomsApi for HttpRoomsClient {
    async fn rooms_by_hotel(&self, hotel_id: &str) -> Result<Vec<Room>, RoomsError> {
        let body: RoomsBody = self
            .client
            .get(self.url(&format!("/rooms/by-hotel/{hotel_id}")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_err(body.err)?;
        Ok(body.rooms)
    }

    async fn room(&self, room_id: &str) -> Result<Option<Room>, RoomsError> {
        let body: RoomBody = self
            .client
            .get(self.url(&format!("/rooms/{room_id}")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_err(body.err)?;
        Ok(body.room)
    }

    async fn clear_should_open(&self, room_id: &str) -> Result<(), RoomsError> {
        let body: AckBody = self
            .client
            .get(self.url(&format!("/rooms/{room_id}/open-success")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_err(body.err)
    }
}
