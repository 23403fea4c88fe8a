//! Door enumeration handling.

use std::sync::Arc;

use async_trait::async_trait;
use doorway_core::protocol::{Door, GetDoors, GetDoorsResp, MsgType};
use prost::Message;

use crate::dispatch::{HandlerError, MessageHandler, Reply};
use crate::rooms::RoomsApi;
use crate::trust::Device;

/// Handles [`MsgType::GetDoors`]: the static room list of the device's
/// hotel, for controller-side display and door mapping.
pub struct GetDoorsHandler {
    rooms: Arc<dyn RoomsApi>,
}

impl GetDoorsHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(rooms: Arc<dyn RoomsApi>) -> Self {
        Self { rooms }
    }
}

#[async_trait]
impl MessageHandler for GetDoorsHandler {
    async fn handle(&self, device: &Device, payload: &[u8]) -> Result<Reply, HandlerError> {
        GetDoors::decode(payload)?;

        let rooms = self
            .rooms
            .rooms_by_hotel(&device.hotel_id)
            .await
            .map_err(|err| HandlerError::Upstream(err.to_string()))?;

        let doors = rooms
            .into_iter()
            .map(|room| Door {
                id: room.id,
                name: room.name,
            })
            .collect();

        Ok(Reply::new(MsgType::GetDoorsResp, &GetDoorsResp { doors }))
    }
}
