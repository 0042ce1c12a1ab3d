mod common;

use axum::http::{header, HeaderValue, StatusCode};
use common::{harness, harness_with, session_cookie, Harness, ScriptedGenerator, StaticIdentity};
use reviewiz_core::i18n::{self, keys, Locale};
use serde_json::{json, Value};
use std::sync::Arc;

async fn employee_with_note(h: &Harness, cookie: &HeaderValue) -> String {
    let employee: Value = h
        .server
        .post("/employees")
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "name": "Ada", "role": "Engineer" }))
        .await
        .json();
    let id = employee["id"].as_str().unwrap().to_string();
    h.server
        .post(&format!("/employees/{}/notes", id))
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "content": "Led the migration", "tag": "positive" }))
        .await;
    id
}

#[tokio::test]
async fn report_is_generated_from_the_employee_record() {
    let generator = ScriptedGenerator::new("  Ada had a strong quarter.  ");
    let h = harness_with(generator.clone(), Arc::new(StaticIdentity));
    let cookie = session_cookie(&h.store, "manager", false).await;
    let id = employee_with_note(&h, &cookie).await;

    let res = h
        .server
        .post(&format!("/employees/{}/artifacts/report?locale=en", id))
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    assert_eq!(body["kind"], "report");
    assert_eq!(body["data"], "Ada had a strong quarter.");

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Ada"));
    assert!(prompts[0].contains("Engineer"));
    assert!(prompts[0].contains("- [positive] Led the migration"));
}

#[tokio::test]
async fn regenerating_replaces_the_previous_artifact() {
    let fenced = "```json\n[{\"title\": \"Rust async\", \"description\": \"Tokio deep dive\", \"duration\": \"2 days\"}]\n```";
    let h = harness_with(ScriptedGenerator::new(fenced), Arc::new(StaticIdentity));
    let cookie = session_cookie(&h.store, "manager", false).await;
    let id = employee_with_note(&h, &cookie).await;
    let url = format!("/employees/{}/artifacts/training", id);

    for _ in 0..2 {
        let res = h
            .server
            .post(&url)
            .add_header(header::COOKIE, cookie.clone())
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
    }

    let listed: Value = h
        .server
        .get(&format!("/employees/{}/artifacts", id))
        .add_header(header::COOKIE, cookie)
        .await
        .json();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["data"][0]["title"], "Rust async");
}

#[tokio::test]
async fn unusable_answers_are_bad_gateway_and_store_nothing() {
    let h = harness_with(ScriptedGenerator::new("I cannot help with that."), Arc::new(StaticIdentity));
    let cookie = session_cookie(&h.store, "manager", false).await;
    let id = employee_with_note(&h, &cookie).await;

    let res = h
        .server
        .post(&format!("/employees/{}/artifacts/okr?locale=en", id))
        .add_header(header::COOKIE, cookie.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text(), i18n::text(Locale::En, keys::GENERATION_ERROR));

    let listed: Value = h
        .server
        .get(&format!("/employees/{}/artifacts", id))
        .add_header(header::COOKIE, cookie)
        .await
        .json();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_credentials_make_generation_unavailable() {
    let h = harness();
    let cookie = session_cookie(&h.store, "manager", false).await;
    let id = employee_with_note(&h, &cookie).await;

    let res = h
        .server
        .post(&format!("/employees/{}/artifacts/reading", id))
        .add_header(header::COOKIE, cookie.clone())
        .add_header(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en"))
        .await;
    assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text(), i18n::text(Locale::En, keys::CONFIG_ERROR));

    // The rest of the service keeps working.
    let listed = h
        .server
        .get("/employees")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(listed.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_kind_and_unknown_employee_are_rejected() {
    let h = harness_with(ScriptedGenerator::new("text"), Arc::new(StaticIdentity));
    let cookie = session_cookie(&h.store, "manager", false).await;
    let id = employee_with_note(&h, &cookie).await;

    let res = h
        .server
        .post(&format!("/employees/{}/artifacts/poem", id))
        .add_header(header::COOKIE, cookie.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = h
        .server
        .post("/employees/00000000-0000-0000-0000-000000000000/artifacts/report")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rewrite_stores_the_polished_note() {
    let answer = r#"{"text": "Ada communicated the delay early and clearly.", "tag": "positive", "category": "communication"}"#;
    let h = harness_with(ScriptedGenerator::new(answer), Arc::new(StaticIdentity));
    let cookie = session_cookie(&h.store, "manager", false).await;
    let id = employee_with_note(&h, &cookie).await;

    let res = h
        .server
        .post(&format!("/employees/{}/notes/rewrite", id))
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "text": "ada told us about delay, good" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let note: Value = res.json();
    assert_eq!(note["content"], "Ada communicated the delay early and clearly.");
    assert_eq!(note["category"], "communication");

    let notes: Value = h
        .server
        .get(&format!("/employees/{}/notes", id))
        .add_header(header::COOKIE, cookie.clone())
        .await
        .json();
    assert_eq!(notes.as_array().unwrap().len(), 2);

    let empty = h
        .server
        .post(&format!("/employees/{}/notes/rewrite", id))
        .add_header(header::COOKIE, cookie)
        .json(&json!({ "text": "   " }))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
}
