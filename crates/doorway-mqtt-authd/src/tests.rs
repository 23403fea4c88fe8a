//! ACL front endpoint tests, driven through the router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use doorway_core::token::{mint, BusIdentity};
use tower::ServiceExt;

use super::*;

const SECRET: &[u8] = b"broker-shared-secret";

fn app() -> Router {
    router(AuthState::new(SECRET.to_vec()))
}

fn identity(uuid: &str, device: bool, relay: bool, superuser: bool) -> BusIdentity {
    BusIdentity {
        uuid: uuid.to_string(),
        device,
        relay,
        superuser,
    }
}

fn token_for(identity: &BusIdentity) -> String {
    mint(identity, SECRET, 1_700_000_000).expect("mint")
}

async fn post(app: Router, path: &str, token: Option<&str>, body: Option<&str>) -> StatusCode {
    let mut builder = Request::builder().method("POST").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(form) => {
            builder = builder.header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            );
            Body::from(form.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    response.status()
}

async fn check_acl(identity: &BusIdentity, topic: &str, acc: &str) -> StatusCode {
    let token = token_for(identity);
    post(
        app(),
        "/acl",
        Some(&token),
        Some(&format!("topic={topic}&acc={acc}")),
    )
    .await
}

#[tokio::test]
async fn auth_requires_a_credential() {
    assert_eq!(post(app(), "/auth", None, None).await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn auth_rejects_a_forged_credential() {
    let forged = mint(&identity("d1", true, false, false), b"wrong-secret", 1_700_000_000)
        .expect("mint");
    assert_eq!(
        post(app(), "/auth", Some(&forged), None).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn auth_accepts_any_role() {
    for (device, relay, superuser) in [(true, false, false), (false, true, false), (false, false, true)] {
        let token = token_for(&identity("x", device, relay, superuser));
        assert_eq!(post(app(), "/auth", Some(&token), None).await, StatusCode::OK);
    }
}

#[tokio::test]
async fn auth_rejects_a_roleless_credential() {
    let token = token_for(&identity("x", false, false, false));
    assert_eq!(
        post(app(), "/auth", Some(&token), None).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn superuser_gate_checks_the_flag_alone() {
    let op = token_for(&identity("ops", false, false, true));
    assert_eq!(post(app(), "/superuser", Some(&op), None).await, StatusCode::OK);

    let dev = token_for(&identity("d1", true, false, false));
    assert_eq!(
        post(app(), "/superuser", Some(&dev), None).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn device_reads_its_own_unlock_topic() {
    let dev = identity("d1", true, false, false);
    assert_eq!(check_acl(&dev, "hotels/d1/room/open", "1").await, StatusCode::OK);
}

#[tokio::test]
async fn device_cannot_read_another_devices_topic() {
    let dev = identity("d1", true, false, false);
    assert_eq!(
        check_acl(&dev, "hotels/d2/room/open", "1").await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn device_writes_its_ping_topic_but_not_its_unlock_topic() {
    let dev = identity("d1", true, false, false);
    assert_eq!(check_acl(&dev, "hotels/d1/ping", "2").await, StatusCode::OK);
    assert_eq!(
        check_acl(&dev, "hotels/d1/room/open", "2").await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn subscribe_is_authorized_as_read() {
    let dev = identity("d1", true, false, false);
    assert_eq!(check_acl(&dev, "hotels/d1/room/open", "4").await, StatusCode::OK);
    assert_eq!(check_acl(&dev, "hotels/d1/ping", "4").await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn relay_fans_out_to_every_hotel() {
    let relay = identity("relay-1", false, true, false);
    assert_eq!(check_acl(&relay, "hotels/d1/room/open", "2").await, StatusCode::OK);
    assert_eq!(check_acl(&relay, "hotels/d2/room/open", "2").await, StatusCode::OK);
    assert_eq!(check_acl(&relay, "hotels/d1/ping", "1").await, StatusCode::OK);
    assert_eq!(
        check_acl(&relay, "hotels/d1/room/open", "1").await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn superuser_has_no_acl_rules() {
    let op = identity("ops", false, false, true);
    assert_eq!(
        check_acl(&op, "hotels/d1/room/open", "1").await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn unknown_access_codes_deny() {
    let dev = identity("d1", true, false, false);
    assert_eq!(
        check_acl(&dev, "hotels/d1/room/open", "3").await,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        check_acl(&dev, "hotels/d1/room/open", "").await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn missing_form_fields_deny() {
    let token = token_for(&identity("d1", true, false, false));
    assert_eq!(
        post(app(), "/acl", Some(&token), Some("")).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn acl_without_a_credential_denies() {
    assert_eq!(
        post(app(), "/acl", None, Some("topic=hotels/d1/ping&acc=2")).await,
        StatusCode::FORBIDDEN
    );
}
