mod common;

use axum::http::{header, StatusCode};
use common::{live_harness, session_cookie, Harness};
use serde_json::{json, Value};
use std::time::Duration;

async fn wait_for_no_subscribers(h: &Harness) {
    for _ in 0..100 {
        if h.store.feed().subscriber_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "{} subscriptions still open after the socket closed",
        h.store.feed().subscriber_count()
    );
}

#[tokio::test]
async fn employee_socket_pushes_a_snapshot_after_every_write() {
    let h = live_harness();
    let cookie = session_cookie(&h.store, "manager", false).await;

    let mut socket = h
        .server
        .get_websocket("/ws/employees")
        .add_header(header::COOKIE, cookie.clone())
        .await
        .into_websocket()
        .await;

    let first: Value = socket.receive_json().await;
    assert_eq!(first["type"], "employees");
    assert!(first["employees"].as_array().unwrap().is_empty());

    h.server
        .post("/employees")
        .add_header(header::COOKIE, cookie)
        .json(&json!({ "name": "Ada", "role": "Engineer" }))
        .await;

    let pushed: Value = socket.receive_json().await;
    assert_eq!(pushed["type"], "employees");
    assert_eq!(pushed["employees"][0]["name"], "Ada");

    socket.close().await;
    wait_for_no_subscribers(&h).await;
}

#[tokio::test]
async fn note_socket_streams_one_employees_notes() {
    let h = live_harness();
    let cookie = session_cookie(&h.store, "manager", false).await;
    let employee: Value = h
        .server
        .post("/employees")
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "name": "Ada", "role": "Engineer" }))
        .await
        .json();
    let id = employee["id"].as_str().unwrap();

    let mut socket = h
        .server
        .get_websocket(&format!("/ws/employees/{}/notes", id))
        .add_header(header::COOKIE, cookie.clone())
        .await
        .into_websocket()
        .await;

    let first: Value = socket.receive_json().await;
    assert_eq!(first["type"], "notes");
    assert_eq!(first["employee_id"], id);
    assert!(first["notes"].as_array().unwrap().is_empty());

    h.server
        .post(&format!("/employees/{}/notes", id))
        .add_header(header::COOKIE, cookie)
        .json(&json!({ "content": "Great demo", "tag": "positive" }))
        .await;

    let pushed: Value = socket.receive_json().await;
    assert_eq!(pushed["type"], "notes");
    assert_eq!(pushed["notes"][0]["content"], "Great demo");

    socket.close().await;
    wait_for_no_subscribers(&h).await;
}

#[tokio::test]
async fn note_socket_for_an_unknown_employee_is_not_found() {
    let h = live_harness();
    let cookie = session_cookie(&h.store, "manager", false).await;

    let res = h
        .server
        .get_websocket("/ws/employees/00000000-0000-0000-0000-000000000000/notes")
        .add_header(header::COOKIE, cookie)
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(h.store.feed().subscriber_count(), 0);
}

#[tokio::test]
async fn sockets_require_a_session() {
    let h = live_harness();

    let res = h
        .server
        .get_websocket("/ws/employees")
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}
