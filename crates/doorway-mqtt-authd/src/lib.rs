//! doorway-mqtt-authd - Doorway broker ACL front library
//!
//! The messaging broker delegates its auth decisions to three HTTP
//! endpoints served here. Each takes a bearer credential (see
//! [`doorway_core::token`]) and answers with a bare status code — 200 to
//! allow, 403 to deny, never a body:
//!
//! - `POST /auth`: is this a valid credential with any role at all?
//! - `POST /superuser`: is this an operator credential?
//! - `POST /acl`: may this caller perform the form-supplied operation
//!   (`acc`: 1 read, 2 write, 4 subscribe) on the form-supplied `topic`?
//!
//! Superusers pass `/auth` and `/superuser` on their flag alone; the rule
//! table only ever sees device and relay roles. Anything unparseable —
//! missing header, bad token, unknown access code — denies.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Form, Router};
use doorway_core::acl::{Access, Role, RuleTable};
use doorway_core::token::{self, BusIdentity};
use serde::Deserialize;
use tracing::{debug, warn};

/// Shared state of the ACL front.
#[derive(Clone)]
pub struct AuthState {
    secret: Arc<Vec<u8>>,
    rules: Arc<RuleTable>,
}

impl AuthState {
    /// Creates the state over the shared broker secret and the standard
    /// rule table.
    #[must_use]
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret: Arc::new(secret),
            rules: Arc::new(RuleTable::standard()),
        }
    }
}

/// Builds the ACL front router.
pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/auth", post(auth))
        .route("/superuser", post(superuser))
        .route("/acl", post(acl))
        .with_state(state)
}

/// Extracts and verifies the bearer credential, if any.
fn bearer_identity(state: &AuthState, headers: &HeaderMap) -> Option<BusIdentity> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ").unwrap_or(header);

    match token::verify(token, &state.secret) {
        Ok(identity) => {
            debug!(uuid = %identity.uuid, "credential verified");
            Some(identity)
        }
        Err(err) => {
            warn!(error = %err, "credential rejected");
            None
        }
    }
}

async fn auth(State(state): State<AuthState>, headers: HeaderMap) -> StatusCode {
    match bearer_identity(&state, &headers) {
        Some(identity) if identity.has_role() => StatusCode::OK,
        _ => StatusCode::FORBIDDEN,
    }
}

async fn superuser(State(state): State<AuthState>, headers: HeaderMap) -> StatusCode {
    match bearer_identity(&state, &headers) {
        Some(identity) if identity.superuser => StatusCode::OK,
        _ => StatusCode::FORBIDDEN,
    }
}

/// Form body the broker sends for ACL checks.
#[derive(Debug, Deserialize)]
pub struct AclForm {
    /// Topic the operation targets.
    #[serde(default)]
    topic: String,
    /// Broker access code: 1 read, 2 write, 4 subscribe.
    #[serde(default)]
    acc: String,
}

async fn acl(
    State(state): State<AuthState>,
    headers: HeaderMap,
    Form(form): Form<AclForm>,
) -> StatusCode {
    let Some(identity) = bearer_identity(&state, &headers) else {
        return StatusCode::FORBIDDEN;
    };
    let Some(access) = Access::from_code(&form.acc) else {
        warn!(acc = %form.acc, "unknown access code");
        return StatusCode::FORBIDDEN;
    };

    // Only controllers and relay servers have table rules; every other
    // identity is denied here regardless of its other privileges.
    let role = if identity.device {
        Role::Device
    } else if identity.relay {
        Role::RelayServer
    } else {
        return StatusCode::FORBIDDEN;
    };

    if state.rules.authorize(role, access, &form.topic, &identity.uuid) {
        StatusCode::OK
    } else {
        warn!(
            uuid = %identity.uuid,
            topic = %form.topic,
            acc = %form.acc,
            "bus operation denied"
        );
        StatusCode::FORBIDDEN
    }
}

#[cfg(test)]
mod tests;
