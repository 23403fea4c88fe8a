//! Pending-action resolution and completion.
//!
//! There is no action queue. A pending unlock exists exactly as long as the
//! room's `shouldOpen` flag is set in the rooms service; resolution is a
//! pure read that recomputes the list on every poll, and completion is the
//! one mutating operation in the protocol. If a completion report is lost,
//! the next poll simply reports the same action again — level-triggered,
//! at-least-once.

use std::sync::Arc;

use doorway_core::protocol::{Action, ActionType};
use thiserror::Error;
use tracing::warn;

use crate::rooms::{RoomsApi, RoomsError};

/// Errors from action resolution and completion.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The reported room id does not exist.
    #[error("unknown room {room_id}")]
    UnknownRoom {
        /// The room id that failed to resolve.
        room_id: String,
    },

    /// The room belongs to a different hotel than the reporting device.
    ///
    /// Treated as a security event: a controller must never clear another
    /// hotel's unlock flag, by accident or otherwise.
    #[error("room {room_id} does not belong to hotel {hotel_id}")]
    WrongHotel {
        /// The reported room id.
        room_id: String,
        /// The hotel of the reporting device.
        hotel_id: String,
    },

    /// The rooms service call failed.
    #[error(transparent)]
    Upstream(#[from] RoomsError),
}

/// Computes pending actions and applies completion reports.
#[derive(Clone)]
pub struct ActionResolver {
    rooms: Arc<dyn RoomsApi>,
}

impl ActionResolver {
    /// Creates a resolver over the given rooms service.
    #[must_use]
    pub fn new(rooms: Arc<dyn RoomsApi>) -> Self {
        Self { rooms }
    }

    /// The pending unlock actions for a hotel.
    ///
    /// Idempotent and side-effect free: two calls without an intervening
    /// completion return the same set.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Upstream`] when the rooms service call fails.
    pub async fn resolve_pending(&self, hotel_id: &str) -> Result<Vec<Action>, ActionError> {
        let rooms = self.rooms.rooms_by_hotel(hotel_id).await?;
        Ok(rooms
            .into_iter()
            .filter(|room| room.should_open)
            .map(|room| Action {
                kind: ActionType::RoomUnlock as i32,
                id: room.id,
            })
            .collect())
    }

    /// Applies a successful unlock report for `room_id` from a device of
    /// `reporting_hotel_id`, clearing the room's open flag.
    ///
    /// The hotel equality check happens here, in the gateway — the rooms
    /// service applies the clear unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::UnknownRoom`] when the room does not exist,
    /// [`ActionError::WrongHotel`] on a cross-hotel report (the flag is
    /// left untouched), and [`ActionError::Upstream`] on service failure.
    pub async fn complete_unlock(
        &self,
        room_id: &str,
        reporting_hotel_id: &str,
    ) -> Result<(), ActionError> {
        let room = self
            .rooms
            .room(room_id)
            .await?
            .ok_or_else(|| ActionError::UnknownRoom {
                room_id: room_id.to_string(),
            })?;

        if room.hotel_id != reporting_hotel_id {
            warn!(
                room_id,
                reporting_hotel_id,
                room_hotel_id = %room.hotel_id,
                "cross-hotel action completion rejected"
            );
            return Err(ActionError::WrongHotel {
                room_id: room_id.to_string(),
                hotel_id: reporting_hotel_id.to_string(),
            });
        }

        self.rooms.clear_should_open(room_id).await?;
        Ok(())
    }
}
