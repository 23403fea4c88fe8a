//! Action list and completion handling.

use std::sync::Arc;

use async_trait::async_trait;
use doorway_core::protocol::{
    ActionComplete, ActionCompleteResp, ActionType, GetActions, GetActionsResp, MsgType,
};
use prost::Message;
use tracing::debug;

use crate::actions::ActionResolver;
use crate::dispatch::{HandlerError, MessageHandler, Reply};
use crate::trust::Device;

/// Handles [`MsgType::GetActions`].
pub struct GetActionsHandler {
    resolver: Arc<ActionResolver>,
}

impl GetActionsHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(resolver: Arc<ActionResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl MessageHandler for GetActionsHandler {
    async fn handle(&self, device: &Device, payload: &[u8]) -> Result<Reply, HandlerError> {
        GetActions::decode(payload)?;

        let actions = self.resolver.resolve_pending(&device.hotel_id).await?;
        debug!(uuid = %device.uuid, pending = actions.len(), "resolved pending actions");
        Ok(Reply::new(MsgType::GetActionsResp, &GetActionsResp { actions }))
    }
}

/// Handles [`MsgType::ActionComplete`].
pub struct ActionCompleteHandler {
    resolver: Arc<ActionResolver>,
}

impl ActionCompleteHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(resolver: Arc<ActionResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl MessageHandler for ActionCompleteHandler {
    async fn handle(&self, device: &Device, payload: &[u8]) -> Result<Reply, HandlerError> {
        let report = ActionComplete::decode(payload)?;

        // Unsuccessful reports are acknowledged without touching the room:
        // the open flag stays set and the action shows up on the next poll.
        if report.success && report.kind == ActionType::RoomUnlock as i32 {
            self.resolver
                .complete_unlock(&report.action_id, &device.hotel_id)
                .await?;
        }

        Ok(Reply::new(MsgType::ActionCompleteResp, &ActionCompleteResp {}))
    }
}
