//! doorway-core - Doorway platform core library
//!
//! This library holds the protocol and policy primitives shared by the
//! Doorway daemons:
//!
//! - [`protocol`]: binary wire messages exchanged between door controllers
//!   and the gateway, and the signed envelope that carries them
//! - [`crypto`]: RSA signing and verification over message payloads, plus
//!   gateway key material management
//! - [`acl`]: the topic-pattern matcher and the fixed authorization rule
//!   table for the messaging bus
//! - [`token`]: bus credential (JWT) minting and verification
//!
//! Everything here is deliberately I/O-free: storage, HTTP, and scheduling
//! live in the daemon crates.

pub mod acl;
pub mod crypto;
pub mod protocol;
pub mod token;
