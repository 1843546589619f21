use axum::http::StatusCode;
use integration_tests::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_returns_the_user_without_internal_id() {
    let app = TestApp::new();
    let user = app.user("alice").await;
    assert_eq!(user["nickname"], "alice");
    assert_eq!(user["email"], "alice@example.org");
    assert!(user.get("id").is_none());
}

#[tokio::test]
async fn duplicate_create_answers_with_every_colliding_user() {
    let app = TestApp::new();
    app.user("alice").await;
    app.user("bob").await;

    // nickname collides with alice, email with bob
    let (status, body) = app
        .post(
            "/api/user/ALICE/create",
            json!({ "fullname": "A", "about": "", "email": "BOB@example.org" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let nicknames: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["nickname"].as_str().unwrap())
        .collect();
    assert_eq!(nicknames.len(), 2);
    assert!(nicknames.contains(&"alice"));
    assert!(nicknames.contains(&"bob"));
}

#[tokio::test]
async fn profile_lookup_is_case_insensitive() {
    let app = TestApp::new();
    app.user("Alice").await;

    let (status, user) = app.get("/api/user/aLiCe/profile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["nickname"], "Alice");

    let (status, body) = app.get("/api/user/nobody/profile").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Can't find user by nobody");
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = TestApp::new();
    app.user("alice").await;

    let (status, user) = app.post("/api/user/alice/profile", json!({ "about": "rustacean" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["about"], "rustacean");
    assert_eq!(user["fullname"], "alice");
    assert_eq!(user["email"], "alice@example.org");
}

#[tokio::test]
async fn update_to_a_taken_email_conflicts() {
    let app = TestApp::new();
    app.user("alice").await;
    app.user("bob").await;

    let (status, body) = app.post("/api/user/alice/profile", json!({ "email": "bob@example.org" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("bob"));

    let (status, _) = app.post("/api/user/nobody/profile", json!({ "about": "x" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let app = TestApp::new();
    let (status, body) = app.post("/api/user/alice/profile", json!("not an object")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}
