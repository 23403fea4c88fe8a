//! doorway-gatewayd - Doorway device gateway daemon library
//!
//! The gateway is the trust boundary between physical door controllers and
//! the reservation platform. Controllers poll it over a single HTTP
//! endpoint carrying signed binary envelopes; the gateway authenticates
//! each request against the device trust store, dispatches it to a handler
//! by message kind, and signs every response with its own key.
//!
//! # Modules
//!
//! - [`trust`]: persistent device trust store (identity, hotel, public key,
//!   liveness state) over SQLite
//! - [`dispatch`]: the envelope dispatcher and its hard authentication
//!   gates
//! - [`handlers`]: one handler per message kind (ping, action fetch,
//!   action completion, door enumeration)
//! - [`actions`]: derived pending-action resolution against the external
//!   rooms service
//! - [`rooms`]: HTTP client for the rooms service
//! - [`sweeper`]: background liveness sweep marking silent devices offline
//! - [`server`]: the axum router exposing the envelope endpoint
//!
//! Pending actions are deliberately never stored: the rooms service's
//! `shouldOpen` flag is the single source of truth, and every poll
//! recomputes the action list from it. A lost completion report therefore
//! surfaces the same action again on the next poll — retry is structural,
//! not a timer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub mod actions;
pub mod dispatch;
pub mod handlers;
pub mod rooms;
pub mod server;
pub mod sweeper;
pub mod trust;

/// Injectable time source.
///
/// Handlers and the sweeper never read the wall clock directly; tests pass
/// a fixed or hand-advanced clock instead.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The production clock.
#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}
