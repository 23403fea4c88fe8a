//! Message handlers, one per request kind.

mod actions;
mod doors;
mod ping;

pub use actions::{ActionCompleteHandler, GetActionsHandler};
pub use doors::GetDoorsHandler;
pub use ping::{PingHandler, MAX_CLOCK_SKEW_SECS};
