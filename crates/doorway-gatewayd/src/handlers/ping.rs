//! Heartbeat handling.

use std::sync::Arc;

use async_trait::async_trait;
use doorway_core::protocol::{MsgType, Ping, PingResp};
use prost::Message;

use crate::actions::ActionResolver;
use crate::dispatch::{HandlerError, MessageHandler, Reply};
use crate::trust::{Device, TrustStore};
use crate::Clock;

/// Maximum tolerated difference between the device clock and the gateway
/// clock, in either direction.
///
/// A controller further out than this cannot be trusted to evaluate
/// time-scoped bookings, so its heartbeat is refused until an operator
/// fixes its clock.
pub const MAX_CLOCK_SKEW_SECS: i64 = 3600;

/// Handles [`MsgType::Ping`].
pub struct PingHandler {
    trust: Arc<dyn TrustStore>,
    resolver: Arc<ActionResolver>,
    clock: Clock,
}

impl PingHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(trust: Arc<dyn TrustStore>, resolver: Arc<ActionResolver>, clock: Clock) -> Self {
        Self {
            trust,
            resolver,
            clock,
        }
    }
}

#[async_trait]
impl MessageHandler for PingHandler {
    async fn handle(&self, device: &Device, payload: &[u8]) -> Result<Reply, HandlerError> {
        let ping = Ping::decode(payload)?;
        let now = (self.clock)();

        let skew = (now.timestamp() - ping.timestamp).abs();
        if skew > MAX_CLOCK_SKEW_SECS {
            // A protocol-level negative, not an exception: the device gets
            // a signed failure response AND the dispatcher logs the error.
            let reply = Reply::new(
                MsgType::PingResp,
                &PingResp {
                    success: false,
                    error: "time out of sync".to_string(),
                    action_required: false,
                },
            );
            return Err(HandlerError::OutOfSync {
                uuid: device.uuid.clone(),
                reply,
            });
        }

        // Liveness first: the device has proven itself alive even when the
        // rooms service is down and action resolution fails below.
        self.trust.touch(&device.uuid, now)?;

        let actions = self.resolver.resolve_pending(&device.hotel_id).await?;
        Ok(Reply::new(
            MsgType::PingResp,
            &PingResp {
                success: true,
                error: String::new(),
                action_required: !actions.is_empty(),
            },
        ))
    }
}
