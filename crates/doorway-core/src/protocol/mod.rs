//! Wire protocol for gateway/controller communication.
//!
//! Door controllers talk to the gateway over a single HTTP endpoint that
//! carries binary-encoded envelopes in both directions. The protocol stack:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Inner message (by kind)          │  Protobuf (Ping, GetActions, ...)
//! ├─────────────────────────────────────────┤
//! │         Signed envelope                  │  kind + payload + signature + sender
//! ├─────────────────────────────────────────┤
//! │         HTTP POST body                   │  one envelope per request/response
//! └─────────────────────────────────────────┘
//! ```
//!
//! The envelope signature is computed over the raw inner-payload bytes,
//! never over the outer envelope, so a payload byte sequence verifies
//! against exactly the signature produced for it — no re-encoding happens
//! between sign and verify.
//!
//! Encoding is deterministic and round-trips exactly: decoding an encoded
//! envelope reproduces the original structured value.

pub mod error;
pub mod messages;

pub use error::{ProtocolError, MAX_ENVELOPE_SIZE};
pub use messages::{
    decode_envelope, Action, ActionComplete, ActionCompleteResp, ActionType, Door, Envelope,
    GetActions, GetActionsResp, GetDoors, GetDoorsResp, MsgType, Ping, PingResp,
};
