//! Envelope dispatcher.
//!
//! Every request passes the same hard gates, in order, with no handler
//! involvement until all of them hold:
//!
//! 1. decode the outer envelope (reject: 400)
//! 2. resolve the claimed device in the trust store (reject: 404)
//! 3. verify the payload signature against the device's stored key
//!    (reject: 406 — an unverifiable signature means the claimed identity
//!    cannot be trusted at all)
//! 4. find a handler for the message kind (reject: 404)
//!
//! A handler failure is logged with the message kind and device UUID. It
//! does not change the HTTP status unless the handler prepared an explicit
//! failure reply (the ping clock-skew path): that reply is signed and
//! returned with 406, a well-formed protocol-level negative rather than an
//! exceptional one. All other handler failures omit the response body.
//!
//! Successful replies are signed with the gateway's own key and wrapped in
//! a response envelope with an empty sender UUID.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use doorway_core::crypto::{verify, Keypair, SignatureError};
use doorway_core::protocol::{decode_envelope, Envelope, MsgType};
use prost::Message;
use thiserror::Error;
use tracing::{error, warn};

use crate::actions::{ActionError, ActionResolver};
use crate::handlers::{ActionCompleteHandler, GetActionsHandler, GetDoorsHandler, PingHandler};
use crate::rooms::RoomsApi;
use crate::trust::{Device, TrustStore, TrustStoreError};
use crate::Clock;

/// An unsigned response payload produced by a handler.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Response message kind.
    pub kind: MsgType,
    /// Encoded inner message; signed by the dispatcher before sending.
    pub payload: Vec<u8>,
}

impl Reply {
    /// Encodes `msg` as a reply of the given kind.
    #[must_use]
    pub fn new<M: Message>(kind: MsgType, msg: &M) -> Self {
        Self {
            kind,
            payload: msg.encode_to_vec(),
        }
    }
}

/// Errors a handler can fail with.
///
/// All of these are logged by the dispatcher; only [`HandlerError::OutOfSync`]
/// also carries a reply for the sender.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The device's clock disagrees with the gateway's beyond tolerance.
    /// Carries the signed-failure reply to return alongside the rejection.
    #[error("device {uuid} clock out of sync")]
    OutOfSync {
        /// The reporting device.
        uuid: String,
        /// Prepared failure reply, signed and sent by the dispatcher.
        reply: Reply,
    },

    /// The inner payload did not decode as the expected message.
    #[error("malformed payload: {0}")]
    Malformed(#[from] prost::DecodeError),

    /// A reported room id did not resolve.
    #[error("unknown room {room_id}")]
    UnknownRoom {
        /// The room id that failed to resolve.
        room_id: String,
    },

    /// A completion report crossed hotel boundaries.
    #[error("room {room_id} does not belong to hotel {hotel_id}")]
    CrossTenant {
        /// The reported room id.
        room_id: String,
        /// The hotel of the reporting device.
        hotel_id: String,
    },

    /// An external service call failed.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// The trust store failed.
    #[error(transparent)]
    Store(#[from] TrustStoreError),
}

impl From<ActionError> for HandlerError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::UnknownRoom { room_id } => Self::UnknownRoom { room_id },
            ActionError::WrongHotel { room_id, hotel_id } => Self::CrossTenant { room_id, hotel_id },
            ActionError::Upstream(err) => Self::Upstream(err.to_string()),
        }
    }
}

/// One handler per message kind.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles a decoded, authenticated request payload for `device`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] on any validation or upstream failure; see
    /// the dispatcher contract for how each is surfaced.
    async fn handle(&self, device: &Device, payload: &[u8]) -> Result<Reply, HandlerError>;
}

/// The envelope dispatcher.
///
/// The handler table is immutable after construction; kinds without an
/// entry are rejected at the gate.
pub struct Dispatcher {
    trust: Arc<dyn TrustStore>,
    keypair: Arc<Keypair>,
    handlers: HashMap<MsgType, Box<dyn MessageHandler>>,
}

impl Dispatcher {
    /// Builds the dispatcher and its handler table.
    #[must_use]
    pub fn new(
        trust: Arc<dyn TrustStore>,
        keypair: Arc<Keypair>,
        rooms: Arc<dyn RoomsApi>,
        clock: Clock,
    ) -> Self {
        let resolver = Arc::new(ActionResolver::new(rooms.clone()));

        let mut handlers: HashMap<MsgType, Box<dyn MessageHandler>> = HashMap::new();
        handlers.insert(
            MsgType::Ping,
            Box::new(PingHandler::new(trust.clone(), resolver.clone(), clock)),
        );
        handlers.insert(
            MsgType::GetActions,
            Box::new(GetActionsHandler::new(resolver.clone())),
        );
        handlers.insert(
            MsgType::ActionComplete,
            Box::new(ActionCompleteHandler::new(resolver)),
        );
        handlers.insert(MsgType::GetDoors, Box::new(GetDoorsHandler::new(rooms)));

        Self {
            trust,
            keypair,
            handlers,
        }
    }

    /// Processes one encoded request envelope into a status and response
    /// body.
    pub async fn dispatch(&self, body: &[u8]) -> (StatusCode, Vec<u8>) {
        let envelope = match decode_envelope(body) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "rejecting malformed envelope");
                return (StatusCode::BAD_REQUEST, Vec::new());
            }
        };

        let device = match self.trust.lookup(&envelope.uuid) {
            Ok(device) => device,
            Err(TrustStoreError::UnknownDevice { uuid }) => {
                warn!(%uuid, "request from unknown device");
                return (StatusCode::NOT_FOUND, Vec::new());
            }
            Err(err) => {
                error!(error = %err, "trust store lookup failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, Vec::new());
            }
        };

        if let Err(err) = verify(&envelope.msg, &envelope.sig, &device.public_key) {
            warn!(uuid = %device.uuid, error = %err, "unable to verify signature");
            return (StatusCode::NOT_ACCEPTABLE, Vec::new());
        }

        let Some(handler) = MsgType::try_from(envelope.kind)
            .ok()
            .and_then(|kind| self.handlers.get(&kind))
        else {
            warn!(kind = envelope.kind, uuid = %device.uuid, "no handler for message kind");
            return (StatusCode::NOT_FOUND, Vec::new());
        };

        match handler.handle(&device, &envelope.msg).await {
            Ok(reply) => self.seal(reply, StatusCode::OK),
            Err(HandlerError::OutOfSync { uuid, reply }) => {
                error!(kind = envelope.kind, %uuid, "handler failed: clock out of sync");
                self.seal(reply, StatusCode::NOT_ACCEPTABLE)
            }
            Err(err) => {
                error!(kind = envelope.kind, uuid = %device.uuid, error = %err, "handler failed");
                (StatusCode::OK, Vec::new())
            }
        }
    }

    /// Signs a reply and wraps it in a response envelope.
    fn seal(&self, reply: Reply, status: StatusCode) -> (StatusCode, Vec<u8>) {
        match self.sign_reply(reply) {
            Ok(body) => (status, body),
            Err(err) => {
                error!(error = %err, "failed to sign response");
                (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
            }
        }
    }

    fn sign_reply(&self, reply: Reply) -> Result<Vec<u8>, SignatureError> {
        let sig = self.keypair.sign(&reply.payload)?;
        let envelope = Envelope {
            kind: reply.kind as i32,
            msg: reply.payload,
            sig,
            uuid: String::new(),
        };
        Ok(envelope.encode_to_vec())
    }
}
