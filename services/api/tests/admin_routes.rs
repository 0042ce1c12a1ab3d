mod common;

use api_lib::{adapters::Unconfigured, create_app, web::AppState};
use async_trait::async_trait;
use axum::http::{header, StatusCode};
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use common::{harness, session_cookie, test_config};
use reviewiz_core::i18n::{self, keys, Locale};
use reviewiz_core::memory::{MemoryStore, ProfileDocument};
use reviewiz_core::ports::{PortError, PortResult, ProfileOrder, ProfileStore};
use reviewiz_core::{UserId, UserProfile};
use serde_json::Value;
use std::sync::Arc;

const T: i64 = 1_700_000_000;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

async fn seed(store: &MemoryStore, path: &str, email: Option<&str>, last_login: Option<i64>, is_admin: bool) {
    store
        .insert_profile_document(
            path,
            ProfileDocument {
                email: email.map(str::to_string),
                display_name: None,
                created_at: at(T - 86_400),
                last_login_at: last_login.map(at),
                is_paid: false,
                is_admin,
            },
        )
        .await;
}

#[tokio::test]
async fn admin_sees_every_profile_most_recent_login_first() {
    let h = harness();
    seed(&h.store, "users/root/profile/account", Some("root@x.io"), Some(T), true).await;
    seed(&h.store, "users/never/profile/account", None, None, false).await;
    seed(&h.store, "users/late/profile/account", Some("late@x.io"), Some(T + 60), false).await;
    let cookie = session_cookie(&h.store, "root", true).await;

    let res = h
        .server
        .get("/admin/users?locale=de")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["state"], "loaded");
    assert_eq!(body["loading"], false);

    let rows = body["rows"].as_array().unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r["user_id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["late", "root", "never"]);
    assert_eq!(rows[1]["last_login_at"], "14.11.2023, 22:13");
    assert_eq!(rows[2]["email"], "N/A");
    assert_eq!(rows[2]["last_login_at"], "-");
    assert_eq!(rows[1]["is_admin"], true);
}

#[tokio::test]
async fn profiles_without_a_derivable_owner_are_left_out() {
    let h = harness();
    seed(&h.store, "users/root/profile/account", Some("root@x.io"), Some(T), true).await;
    seed(&h.store, "orphans/account", Some("ghost@x.io"), Some(T + 10), false).await;
    seed(&h.store, "users//profile/account", Some("blank@x.io"), Some(T + 20), false).await;
    let cookie = session_cookie(&h.store, "root", true).await;

    let body: Value = h
        .server
        .get("/admin/users")
        .add_header(header::COOKIE, cookie)
        .await
        .json();
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["email"], "root@x.io");
}

#[tokio::test]
async fn non_admin_is_denied_without_rows() {
    let h = harness();
    seed(&h.store, "users/plain/profile/account", Some("plain@x.io"), Some(T), false).await;
    let cookie = session_cookie(&h.store, "plain", false).await;

    let res = h
        .server
        .get("/admin/users?locale=en")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    let body: Value = res.json();
    assert_eq!(body["state"], "denied");
    assert_eq!(body["loading"], false);
    assert_eq!(body["message"], i18n::text(Locale::En, keys::ADMIN_ACCESS_DENIED));
    assert!(body.get("rows").is_none());
}

/// Profile reads always fail, as when the rules reject a cross-user query.
struct RejectingProfiles;

#[async_trait]
impl ProfileStore for RejectingProfiles {
    async fn get_profile(&self, _user_id: &UserId) -> PortResult<UserProfile> {
        Err(PortError::Unauthorized)
    }

    async fn create_profile(&self, _profile: UserProfile) -> PortResult<()> {
        Err(PortError::Unauthorized)
    }

    async fn touch_last_login(&self, _user_id: &UserId, _at: DateTime<Utc>) -> PortResult<()> {
        Err(PortError::Unauthorized)
    }

    async fn list_all_profiles(&self, _order: ProfileOrder) -> PortResult<Vec<UserProfile>> {
        Err(PortError::Unauthorized)
    }
}

#[tokio::test]
async fn failed_query_shows_a_dismissible_banner() {
    let store = MemoryStore::new();
    let mut state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(Unconfigured::new("GEMINI_API_KEY or OPENAI_API_KEY")),
        Arc::new(Unconfigured::new("GOOGLE_CLIENT_ID")),
        test_config(),
    );
    state.profiles = Arc::new(RejectingProfiles);
    let server = TestServer::new(create_app(Arc::new(state))).expect("Failed to create TestServer");
    let cookie = session_cookie(&store, "root", true).await;

    let res = server
        .get("/admin/users?locale=fr")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json();
    assert_eq!(body["state"], "failed");
    assert_eq!(body["loading"], false);
    assert_eq!(body["banner"]["dismissible"], true);
    assert_eq!(
        body["banner"]["message"],
        i18n::text(Locale::Fr, keys::ADMIN_LOAD_ERROR)
    );
}
