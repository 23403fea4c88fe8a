//! End-to-end dispatcher tests: authenticated envelopes in, signed
//! envelopes out, against a real (in-memory) trust store and a fake rooms
//! service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, TimeZone, Utc};
use doorway_core::crypto::{verify, Keypair};
use doorway_core::protocol::{
    decode_envelope, ActionComplete, ActionCompleteResp, ActionType, Envelope, GetActions,
    GetActionsResp, GetDoors, GetDoorsResp, MsgType, Ping, PingResp,
};
use doorway_gatewayd::dispatch::Dispatcher;
use doorway_gatewayd::rooms::{Room, RoomsApi, RoomsError};
use doorway_gatewayd::trust::{Device, SqliteTrustStore, TrustStore};
use doorway_gatewayd::Clock;
use prost::Message;

const GATEWAY_KEY_PEM: &str = include_str!("fixtures/gateway.pem");
const DEVICE_KEY_PEM: &str = include_str!("fixtures/device.pem");

const DEVICE_UUID: &str = "4a9f6f0e-0d63-4b2e-9f3a-7b1d2c5e8a10";
const HOTEL_ID: &str = "hotel-1";

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

/// Fixed test clock.
const NOW_SECS: i64 = 1_700_000_000;

struct FakeRooms {
    rooms: Mutex<Vec<Room>>,
}

impl FakeRooms {
    fn should_open(&self, room_id: &str) -> bool {
        self.rooms
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == room_id)
            .map(|r| r.should_open)
            .unwrap_or(false)
    }
}

#[async_trait]
impl RoomsApi for FakeRooms {
    async fn rooms_by_hotel(&self, hotel_id: &str) -> Result<Vec<Room>, RoomsError> {
        Ok(self
            .rooms
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.hotel_id == hotel_id)
            .cloned()
            .collect())
    }

    async fn room(&self, room_id: &str) -> Result<Option<Room>, RoomsError> {
        Ok(self
            .rooms
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == room_id)
            .cloned())
    }

    async fn clear_should_open(&self, room_id: &str) -> Result<(), RoomsError> {
        let mut rooms = self.rooms.lock().unwrap();
        if let Some(room) = rooms.iter_mut().find(|r| r.id == room_id) {
            room.should_open = false;
        }
        Ok(())
    }
}

struct Harness {
    dispatcher: Dispatcher,
    trust: Arc<dyn TrustStore>,
    rooms: Arc<FakeRooms>,
    device_key: Keypair,
    gateway_pub_der: Vec<u8>,
}

fn room(id: &str, hotel: &str, should_open: bool) -> Room {
    Room {
        id: id.to_string(),
        name: format!("Room {id}"),
        hotel_id: hotel.to_string(),
        should_open,
    }
}

fn harness(rooms: Vec<Room>) -> Harness {
    let device_key = Keypair::from_pkcs8_pem(DEVICE_KEY_PEM).expect("device key");
    let gateway_key = Keypair::from_pkcs8_pem(GATEWAY_KEY_PEM).expect("gateway key");
    let gateway_pub_der = gateway_key.public_key_der().expect("gateway pub");

    let store = SqliteTrustStore::open_in_memory().expect("store");
    store
        .register(&Device {
            uuid: DEVICE_UUID.to_string(),
            hotel_id: HOTEL_ID.to_string(),
            public_key: device_key.public_key_der().expect("device pub"),
            last_seen: DateTime::UNIX_EPOCH,
            online: false,
        })
        .expect("register");

    let trust: Arc<dyn TrustStore> = Arc::new(store);
    let rooms = Arc::new(FakeRooms {
        rooms: Mutex::new(rooms),
    });
    let clock: Clock = Arc::new(|| ts(NOW_SECS));

    let dispatcher = Dispatcher::new(
        trust.clone(),
        Arc::new(gateway_key),
        rooms.clone(),
        clock,
    );

    Harness {
        dispatcher,
        trust,
        rooms,
        device_key,
        gateway_pub_der,
    }
}

/// Builds a signed request envelope the way a controller does.
fn request<M: Message>(harness: &Harness, kind: MsgType, msg: &M) -> Vec<u8> {
    let payload = msg.encode_to_vec();
    let sig = harness.device_key.sign(&payload).expect("sign");
    Envelope {
        kind: kind as i32,
        msg: payload,
        sig,
        uuid: DEVICE_UUID.to_string(),
    }
    .encode_to_vec()
}

/// Decodes a gateway response envelope, verifying its signature.
fn response<M: Message + Default>(harness: &Harness, kind: MsgType, body: &[u8]) -> M {
    let envelope = decode_envelope(body).expect("response envelope");
    assert_eq!(envelope.kind, kind as i32);
    assert!(envelope.uuid.is_empty(), "gateway responses carry no uuid");
    verify(&envelope.msg, &envelope.sig, &harness.gateway_pub_der)
        .expect("gateway response signature");
    M::decode(envelope.msg.as_slice()).expect("response payload")
}

#[tokio::test]
async fn stale_ping_gets_a_signed_failure_and_no_liveness() {
    let h = harness(vec![]);
    let two_hours_ago = NOW_SECS - 7200;
    let body = request(&h, MsgType::Ping, &Ping { timestamp: two_hours_ago });

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);

    let ping_resp: PingResp = response(&h, MsgType::PingResp, &resp);
    assert!(!ping_resp.success);
    assert_eq!(ping_resp.error, "time out of sync");

    let device = h.trust.lookup(DEVICE_UUID).expect("lookup");
    assert!(!device.online, "a refused ping must not mark the device online");
}

#[tokio::test]
async fn fresh_ping_touches_the_device_and_reports_pending_work() {
    let h = harness(vec![room("r1", HOTEL_ID, true)]);
    let body = request(&h, MsgType::Ping, &Ping { timestamp: NOW_SECS - 30 });

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::OK);

    let ping_resp: PingResp = response(&h, MsgType::PingResp, &resp);
    assert!(ping_resp.success);
    assert!(ping_resp.action_required);
    assert!(ping_resp.error.is_empty());

    let device = h.trust.lookup(DEVICE_UUID).expect("lookup");
    assert!(device.online);
    assert_eq!(device.last_seen, ts(NOW_SECS));
}

#[tokio::test]
async fn fresh_ping_without_pending_work_says_so() {
    let h = harness(vec![room("r1", HOTEL_ID, false)]);
    let body = request(&h, MsgType::Ping, &Ping { timestamp: NOW_SECS });

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::OK);
    let ping_resp: PingResp = response(&h, MsgType::PingResp, &resp);
    assert!(ping_resp.success);
    assert!(!ping_resp.action_required);
}

#[tokio::test]
async fn unknown_device_is_rejected_before_any_handler_runs() {
    let h = harness(vec![]);
    let payload = Ping { timestamp: NOW_SECS }.encode_to_vec();
    let sig = h.device_key.sign(&payload).expect("sign");
    let body = Envelope {
        kind: MsgType::Ping as i32,
        msg: payload,
        sig,
        uuid: "not-a-known-device".to_string(),
    }
    .encode_to_vec();

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(resp.is_empty());
}

#[tokio::test]
async fn tampered_signature_is_rejected() {
    let h = harness(vec![]);
    let body = request(&h, MsgType::Ping, &Ping { timestamp: NOW_SECS });
    // Flip a bit inside the signature field.
    let mut envelope = decode_envelope(&body).expect("request envelope");
    envelope.sig[0] ^= 0x01;
    let body = envelope.encode_to_vec();

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert!(resp.is_empty());

    let device = h.trust.lookup(DEVICE_UUID).expect("lookup");
    assert!(!device.online);
}

#[tokio::test]
async fn malformed_envelope_is_a_bad_request() {
    let h = harness(vec![]);
    let (status, resp) = h.dispatcher.dispatch(&[0xFF, 0xFF, 0xFF]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp.is_empty());
}

#[tokio::test]
async fn request_with_a_response_kind_finds_no_handler() {
    let h = harness(vec![]);
    let body = request(
        &h,
        MsgType::PingResp,
        &PingResp {
            success: true,
            error: String::new(),
            action_required: false,
        },
    );

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(resp.is_empty());
}

#[tokio::test]
async fn get_actions_lists_every_open_room_of_the_hotel() {
    let h = harness(vec![
        room("r1", HOTEL_ID, true),
        room("r2", HOTEL_ID, false),
        room("r3", "other-hotel", true),
    ]);
    let body = request(&h, MsgType::GetActions, &GetActions {});

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::OK);

    let actions: GetActionsResp = response(&h, MsgType::GetActionsResp, &resp);
    assert_eq!(actions.actions.len(), 1);
    assert_eq!(actions.actions[0].id, "r1");
    assert_eq!(actions.actions[0].kind, ActionType::RoomUnlock as i32);
}

#[tokio::test]
async fn successful_completion_clears_the_room_flag() {
    let h = harness(vec![room("r1", HOTEL_ID, true)]);
    let body = request(
        &h,
        MsgType::ActionComplete,
        &ActionComplete {
            kind: ActionType::RoomUnlock as i32,
            action_id: "r1".to_string(),
            success: true,
        },
    );

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::OK);
    let _ack: ActionCompleteResp = response(&h, MsgType::ActionCompleteResp, &resp);
    assert!(!h.rooms.should_open("r1"));
}

#[tokio::test]
async fn cross_hotel_completion_is_swallowed_and_changes_nothing() {
    let h = harness(vec![room("r9", "other-hotel", true)]);
    let body = request(
        &h,
        MsgType::ActionComplete,
        &ActionComplete {
            kind: ActionType::RoomUnlock as i32,
            action_id: "r9".to_string(),
            success: true,
        },
    );

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    // A handler failure without a prepared reply omits the response body.
    assert_eq!(status, StatusCode::OK);
    assert!(resp.is_empty());
    assert!(h.rooms.should_open("r9"), "the other hotel's flag must survive");
}

#[tokio::test]
async fn failed_completion_reports_are_acknowledged_without_clearing() {
    let h = harness(vec![room("r1", HOTEL_ID, true)]);
    let body = request(
        &h,
        MsgType::ActionComplete,
        &ActionComplete {
            kind: ActionType::RoomUnlock as i32,
            action_id: "r1".to_string(),
            success: false,
        },
    );

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::OK);
    let _ack: ActionCompleteResp = response(&h, MsgType::ActionCompleteResp, &resp);
    assert!(h.rooms.should_open("r1"), "the action must stay pending");
}

#[tokio::test]
async fn get_doors_enumerates_the_hotel_rooms() {
    let h = harness(vec![
        room("r1", HOTEL_ID, false),
        room("r2", HOTEL_ID, true),
        room("r3", "other-hotel", false),
    ]);
    let body = request(&h, MsgType::GetDoors, &GetDoors {});

    let (status, resp) = h.dispatcher.dispatch(&body).await;
    assert_eq!(status, StatusCode::OK);

    let doors: GetDoorsResp = response(&h, MsgType::GetDoorsResp, &resp);
    let mut ids: Vec<&str> = doors.doors.iter().map(|d| d.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["r1", "r2"]);
}
