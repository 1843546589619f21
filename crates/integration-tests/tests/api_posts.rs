use axum::http::StatusCode;
use integration_tests::{root, TestApp};
use serde_json::json;

async fn one_post() -> (TestApp, i64) {
    let app = TestApp::new();
    app.user("alice").await;
    app.forum("rust", "alice").await;
    app.thread("rust", "alice", Some("t")).await;
    let id = app.posts("t", json!([root("alice")])).await[0];
    (app, id)
}

#[tokio::test]
async fn details_include_requested_relations_only() {
    let (app, id) = one_post().await;

    let (status, details) = app.get(&format!("/api/post/{id}/details")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["post"]["id"], id);
    assert!(details.get("author").is_none());
    assert!(details.get("thread").is_none());
    assert!(details.get("forum").is_none());

    let (_, details) = app.get(&format!("/api/post/{id}/details?related=user,thread,forum")).await;
    assert_eq!(details["author"]["nickname"], "alice");
    assert_eq!(details["thread"]["slug"], "t");
    assert_eq!(details["forum"]["slug"], "rust");
    assert_eq!(details["forum"]["posts"], 1);
}

#[tokio::test]
async fn unknown_post_is_not_found() {
    let (app, _) = one_post().await;
    let (status, _) = app.get("/api/post/424242/details").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/post/abc/details").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_marks_the_post_only_when_the_message_changes() {
    let (app, id) = one_post().await;
    let uri = format!("/api/post/{id}/details");

    let (status, post) = app.post(&uri, json!({ "message": "top level" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["isEdited"], false);

    let (_, post) = app.post(&uri, json!({})).await;
    assert_eq!(post["isEdited"], false);

    let (_, post) = app.post(&uri, json!({ "message": "edited" })).await;
    assert_eq!(post["isEdited"], true);
    assert_eq!(post["message"], "edited");

    let (status, _) = app.post("/api/post/424242/details", json!({ "message": "x" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
