mod common;

use axum::http::{header, StatusCode};
use common::{harness, session_cookie};
use serde_json::{json, Value};

#[tokio::test]
async fn employee_lifecycle() {
    let h = harness();
    let cookie = session_cookie(&h.store, "manager", false).await;

    let created = h
        .server
        .post("/employees")
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "name": "  Ada ", "role": "Engineer" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let employee: Value = created.json();
    assert_eq!(employee["name"], "Ada");
    let id = employee["id"].as_str().unwrap().to_string();

    let updated = h
        .server
        .put(&format!("/employees/{}", id))
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "name": "Ada Lovelace", "role": "Lead" }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);

    let listed: Value = h
        .server
        .get("/employees")
        .add_header(header::COOKIE, cookie.clone())
        .await
        .json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["role"], "Lead");

    let blank = h
        .server
        .post("/employees")
        .add_header(header::COOKIE, cookie)
        .json(&json!({ "name": "   ", "role": "Engineer" }))
        .await;
    assert_eq!(blank.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn employees_are_private_to_their_manager() {
    let h = harness();
    let owner = session_cookie(&h.store, "owner", false).await;
    let other = session_cookie(&h.store, "other", false).await;

    let employee: Value = h
        .server
        .post("/employees")
        .add_header(header::COOKIE, owner)
        .json(&json!({ "name": "Ada", "role": "Engineer" }))
        .await
        .json();
    let id = employee["id"].as_str().unwrap();

    let res = h
        .server
        .get(&format!("/employees/{}", id))
        .add_header(header::COOKIE, other.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let listed: Value = h
        .server
        .get("/employees")
        .add_header(header::COOKIE, other)
        .await
        .json();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn notes_are_tagged_listed_newest_first_and_patched() {
    let h = harness();
    let cookie = session_cookie(&h.store, "manager", false).await;
    let employee: Value = h
        .server
        .post("/employees")
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "name": "Ada", "role": "Engineer" }))
        .await
        .json();
    let notes_url = format!("/employees/{}/notes", employee["id"].as_str().unwrap());

    let first = h
        .server
        .post(&notes_url)
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "content": "Shipped the importer", "tag": "positive" }))
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let second: Value = h
        .server
        .post(&notes_url)
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "content": "Missed a review", "tag": "negative", "category": "process" }))
        .await
        .json();
    assert_eq!(second["tag"], "improvement");
    assert_eq!(second["category"], "process");

    let bad_tag = h
        .server
        .post(&notes_url)
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "content": "Hmm", "tag": "spicy" }))
        .await;
    assert_eq!(bad_tag.status_code(), StatusCode::BAD_REQUEST);

    let listed: Value = h
        .server
        .get(&notes_url)
        .add_header(header::COOKIE, cookie.clone())
        .await
        .json();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["content"], "Missed a review");

    let patched: Value = h
        .server
        .put(&format!("{}/{}", notes_url, second["id"].as_str().unwrap()))
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "completed": true }))
        .await
        .json();
    assert_eq!(patched["completed"], true);
    assert_eq!(patched["content"], "Missed a review");

    let blanked = h
        .server
        .put(&format!("{}/{}", notes_url, second["id"].as_str().unwrap()))
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "content": "   " }))
        .await;
    assert_eq!(blanked.status_code(), StatusCode::BAD_REQUEST);
    let listed: Value = h
        .server
        .get(&notes_url)
        .add_header(header::COOKIE, cookie.clone())
        .await
        .json();
    assert_eq!(listed[0]["content"], "Missed a review");

    let deleted = h
        .server
        .delete(&format!("{}/{}", notes_url, second["id"].as_str().unwrap()))
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deleting_an_employee_removes_its_notes() {
    let h = harness();
    let cookie = session_cookie(&h.store, "manager", false).await;
    let employee: Value = h
        .server
        .post("/employees")
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "name": "Ada", "role": "Engineer" }))
        .await
        .json();
    let url = format!("/employees/{}", employee["id"].as_str().unwrap());
    h.server
        .post(&format!("{}/notes", url))
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "content": "Great demo", "tag": "positive" }))
        .await;

    let res = h
        .server
        .delete(&url)
        .add_header(header::COOKIE, cookie.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let notes: Value = h
        .server
        .get(&format!("{}/notes", url))
        .add_header(header::COOKIE, cookie.clone())
        .await
        .json();
    assert!(notes.as_array().unwrap().is_empty());

    let again = h
        .server
        .delete(&url)
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn string_tables_fall_back_to_the_default_locale() {
    let h = harness();

    let de: Value = h.server.get("/i18n/de-DE").await.json();
    assert_eq!(de["locale"], "de");
    assert_eq!(de["strings"]["admin.column.paid"], "Bezahlt");

    let unknown: Value = h.server.get("/i18n/ja").await.json();
    assert_eq!(unknown["locale"], "fr");
}
