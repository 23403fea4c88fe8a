//! Protocol buffer message types for gateway/controller communication.
//!
//! The message set is small and stable, so the types are maintained by hand
//! rather than generated from a schema at build time; field tags are part of
//! the wire contract and must never be renumbered.
//!
//! # Message kinds
//!
//! Requests originate from door controllers, responses from the gateway:
//!
//! - [`Ping`] / [`PingResp`]: heartbeat with a pending-work hint
//! - [`GetActions`] / [`GetActionsResp`]: fetch the pending action list
//! - [`ActionComplete`] / [`ActionCompleteResp`]: report an action outcome
//! - [`GetDoors`] / [`GetDoorsResp`]: enumerate the doors of the
//!   controller's hotel
//!
//! Every request and response travels inside an [`Envelope`] whose `sig`
//! field is an RSA signature over the raw `msg` bytes (see [`crate::crypto`]).

use prost::Message;

use super::error::{ProtocolError, MAX_ENVELOPE_SIZE};

/// Outer signed wire message.
///
/// `uuid` is the sender's claimed device identity on requests. Gateway
/// responses leave it empty: controllers authenticate the gateway by its
/// published public key, not by envelope identity.
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    /// Message kind discriminant, see [`MsgType`].
    #[prost(enumeration = "MsgType", tag = "1")]
    pub kind: i32,
    /// Encoded inner message.
    #[prost(bytes = "vec", tag = "2")]
    pub msg: Vec<u8>,
    /// RSA PKCS#1 v1.5 signature over `msg`.
    #[prost(bytes = "vec", tag = "3")]
    pub sig: Vec<u8>,
    /// Claimed sender device UUID (requests only).
    #[prost(string, tag = "4")]
    pub uuid: String,
}

/// Message kind carried in [`Envelope::kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum MsgType {
    /// Unset; never valid on the wire.
    Unspecified = 0,
    /// Controller heartbeat.
    Ping = 1,
    /// Gateway reply to [`MsgType::Ping`].
    PingResp = 2,
    /// Controller requests its pending action list.
    GetActions = 3,
    /// Gateway reply to [`MsgType::GetActions`].
    GetActionsResp = 4,
    /// Controller reports an action outcome.
    ActionComplete = 5,
    /// Gateway reply to [`MsgType::ActionComplete`].
    ActionCompleteResp = 6,
    /// Controller requests the door list for its hotel.
    GetDoors = 7,
    /// Gateway reply to [`MsgType::GetDoors`].
    GetDoorsResp = 8,
}

/// Kind of a pending action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ActionType {
    /// Unset; never valid on the wire.
    Unspecified = 0,
    /// Unlock a room door.
    RoomUnlock = 1,
}

/// Controller heartbeat.
#[derive(Clone, Copy, PartialEq, Message)]
pub struct Ping {
    /// Controller wall clock, seconds since the Unix epoch.
    #[prost(int64, tag = "1")]
    pub timestamp: i64,
}

/// Gateway reply to a heartbeat.
#[derive(Clone, PartialEq, Message)]
pub struct PingResp {
    /// Whether the heartbeat was accepted.
    #[prost(bool, tag = "1")]
    pub success: bool,
    /// Human-readable failure reason when `success` is false.
    #[prost(string, tag = "2")]
    pub error: String,
    /// True when the controller has at least one pending action and should
    /// follow up with [`GetActions`].
    #[prost(bool, tag = "3")]
    pub action_required: bool,
}

/// Request for the pending action list.
#[derive(Clone, Copy, PartialEq, Message)]
pub struct GetActions {}

/// A single pending action.
///
/// Actions have no identity of their own: an unlock action is keyed by the
/// room it targets and exists only while that room's open flag is set.
#[derive(Clone, PartialEq, Message)]
pub struct Action {
    /// What to do.
    #[prost(enumeration = "ActionType", tag = "1")]
    pub kind: i32,
    /// Target room id.
    #[prost(string, tag = "2")]
    pub id: String,
}

/// Gateway reply carrying the full pending action list.
#[derive(Clone, PartialEq, Message)]
pub struct GetActionsResp {
    /// Pending actions for the controller's hotel.
    #[prost(message, repeated, tag = "1")]
    pub actions: Vec<Action>,
}

/// Controller report that an action was attempted.
#[derive(Clone, PartialEq, Message)]
pub struct ActionComplete {
    /// Kind of the attempted action.
    #[prost(enumeration = "ActionType", tag = "1")]
    pub kind: i32,
    /// Id of the attempted action (the target room id for unlocks).
    #[prost(string, tag = "2")]
    pub action_id: String,
    /// Whether the controller carried the action out.
    #[prost(bool, tag = "3")]
    pub success: bool,
}

/// Acknowledgement of an [`ActionComplete`] report.
#[derive(Clone, Copy, PartialEq, Message)]
pub struct ActionCompleteResp {}

/// Request for the door list of the controller's hotel.
#[derive(Clone, Copy, PartialEq, Message)]
pub struct GetDoors {}

/// One door, for enumeration and controller-side UI.
#[derive(Clone, PartialEq, Message)]
pub struct Door {
    /// Room id.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Display name.
    #[prost(string, tag = "2")]
    pub name: String,
}

/// Gateway reply carrying the door list.
#[derive(Clone, PartialEq, Message)]
pub struct GetDoorsResp {
    /// Doors of the controller's hotel.
    #[prost(message, repeated, tag = "1")]
    pub doors: Vec<Door>,
}

/// Decodes an outer envelope, enforcing the size cap before parsing.
///
/// # Errors
///
/// Returns [`ProtocolError::EnvelopeTooLarge`] for oversize input and
/// [`ProtocolError::Malformed`] when the bytes are not a valid envelope.
pub fn decode_envelope(buf: &[u8]) -> Result<Envelope, ProtocolError> {
    if buf.len() > MAX_ENVELOPE_SIZE {
        return Err(ProtocolError::EnvelopeTooLarge {
            size: buf.len(),
            max: MAX_ENVELOPE_SIZE,
        });
    }
    Ok(Envelope::decode(buf)?)
}
