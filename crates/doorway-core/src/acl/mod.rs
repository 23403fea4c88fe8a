//! Topic access control for the messaging bus.
//!
//! Door controllers and relay servers publish and subscribe on a
//! `/`-delimited topic hierarchy (`hotels/<uuid>/room/open`,
//! `hotels/<uuid>/ping`, ...). This module decides which (role, topic,
//! operation) combinations are permitted.
//!
//! # Security Model
//!
//! - **Default deny**: an operation is allowed only when a rule in the
//!   fixed table matches; every other request is refused.
//! - **Identity-bound patterns**: the `%u` pattern segment binds a rule to
//!   the caller's own UUID, so a controller can never read another
//!   controller's topics.
//! - **Superusers** bypass the table entirely; that gate lives at the HTTP
//!   front and never routes through the matcher.
//!
//! The rule table is immutable and constructed once at startup
//! ([`RuleTable::standard`]); there is no runtime registration.

mod matcher;
mod rules;


pub use matcher::{topic_matches, LITERAL_PLUS_COLLAPSES_HASH};
pub use rules::{Access, Role, Rule, RuleTable};
