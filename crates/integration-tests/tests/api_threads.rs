use axum::http::StatusCode;
use integration_tests::{ids, reply, root, TestApp};
use serde_json::json;

/// Posts, in creation order:
///
/// a
/// ├── c
/// │   └── e
/// └── d
/// b
/// └── f
/// g
struct Forest {
    app: TestApp,
    a: i64,
    b: i64,
    c: i64,
    d: i64,
    e: i64,
    f: i64,
    g: i64,
}

async fn forest() -> Forest {
    let app = TestApp::new();
    app.user("alice").await;
    app.forum("rust", "alice").await;
    app.thread("rust", "alice", Some("tree")).await;

    let a = app.posts("tree", json!([root("alice")])).await[0];
    let b = app.posts("tree", json!([root("alice")])).await[0];
    let cd = app.posts("tree", json!([reply(a, "alice"), reply(a, "alice")])).await;
    let (c, d) = (cd[0], cd[1]);
    let e = app.posts("tree", json!([reply(c, "alice")])).await[0];
    let f = app.posts("tree", json!([reply(b, "alice")])).await[0];
    let g = app.posts("tree", json!([root("alice")])).await[0];
    Forest { app, a, b, c, d, e, f, g }
}

impl Forest {
    async fn page(&self, query: &str) -> Vec<i64> {
        let (status, posts) = self.app.get(&format!("/api/thread/tree/posts?{query}")).await;
        assert_eq!(status, StatusCode::OK, "{posts}");
        ids(&posts)
    }
}

#[tokio::test]
async fn flat_listing_is_chronological() {
    let t = forest().await;
    let Forest { a, b, c, d, e, f, g, .. } = t;

    assert_eq!(t.page("").await, vec![a, b, c, d, e, f, g]);
    assert_eq!(t.page("sort=flat&desc=true").await, vec![g, f, e, d, c, b, a]);
    assert_eq!(t.page(&format!("sort=flat&since={c}&limit=2")).await, vec![d, e]);
    assert_eq!(t.page(&format!("sort=flat&since={c}&desc=true")).await, vec![b, a]);
}

#[tokio::test]
async fn tree_listing_is_depth_first() {
    let t = forest().await;
    let Forest { a, b, c, d, e, f, g, .. } = t;

    assert_eq!(t.page("sort=tree").await, vec![a, c, e, d, b, f, g]);
    assert_eq!(t.page("sort=tree&desc=true").await, vec![g, f, b, d, e, c, a]);
    assert_eq!(t.page(&format!("sort=tree&since={c}&limit=3")).await, vec![e, d, b]);
    assert_eq!(t.page(&format!("sort=tree&since={d}&desc=true&limit=2")).await, vec![e, c]);
}

#[tokio::test]
async fn tree_pages_chain_without_gaps() {
    let t = forest().await;
    let mut seen = Vec::new();
    let mut cursor: Option<i64> = None;
    loop {
        let query = match cursor {
            Some(since) => format!("sort=tree&limit=2&since={since}"),
            None => "sort=tree&limit=2".to_string(),
        };
        let page = t.page(&query).await;
        if page.is_empty() {
            break;
        }
        cursor = page.last().copied();
        seen.extend(page);
    }
    assert_eq!(seen, t.page("sort=tree").await);
}

#[tokio::test]
async fn parent_tree_limits_roots() {
    let t = forest().await;
    let Forest { a, b, c, d, e, f, g, .. } = t;

    assert_eq!(t.page("sort=parent_tree&limit=2").await, vec![a, c, e, d, b, f]);
    // any post of the last root works as cursor
    assert_eq!(t.page(&format!("sort=parent_tree&limit=2&since={f}")).await, vec![g]);
    assert_eq!(t.page(&format!("sort=parent_tree&limit=2&since={b}")).await, vec![g]);
}

#[tokio::test]
async fn parent_tree_desc_keeps_replies_in_path_order() {
    let t = forest().await;
    let Forest { a, b, c, d, e, f, g, .. } = t;

    assert_eq!(t.page("sort=parent_tree&limit=1&desc=true").await, vec![g]);
    assert_eq!(
        t.page(&format!("sort=parent_tree&limit=2&desc=true&since={g}")).await,
        vec![b, f, a, c, e, d]
    );
}

#[tokio::test]
async fn cursor_of_another_thread_yields_an_empty_page() {
    let t = forest().await;
    t.app.thread("rust", "alice", Some("other")).await;
    let stranger = t.app.posts("other", json!([root("alice")])).await[0];

    assert!(t.page(&format!("sort=tree&since={stranger}")).await.is_empty());
    assert!(t.page(&format!("sort=parent_tree&since={stranger}")).await.is_empty());
}

#[tokio::test]
async fn listing_rejects_bad_parameters() {
    let t = forest().await;
    let (status, _) = t.app.get("/api/thread/tree/posts?sort=random").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t.app.get("/api/thread/tree/posts?limit=-3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t.app.get("/api/thread/missing/posts").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_thread_wins_over_malformed_input() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/thread/missing/posts?sort=random&limit=-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post("/api/thread/missing/vote", json!({ "voice": "up" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post("/api/thread/missing/create", json!({ "not": "a list" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_posts_share_forum_thread_and_timestamp() {
    let app = TestApp::new();
    app.user("alice").await;
    app.user("bob").await;
    app.forum("rust", "alice").await;
    let thread = app.thread("rust", "alice", Some("batch")).await;

    let (status, posts) = app
        .post("/api/thread/BATCH/create", json!([root("ALICE"), root("bob")]))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let posts = posts.as_array().unwrap().clone();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["author"], "alice");
    assert_eq!(posts[0]["thread"], thread["id"]);
    assert_eq!(posts[0]["forum"], "rust");
    assert_eq!(posts[0]["created"], posts[1]["created"]);
    assert_eq!(posts[0]["isEdited"], false);
    assert_eq!(posts[0]["parent"], 0);
    assert!(posts[0].get("path").is_none());
}

#[tokio::test]
async fn empty_batch_is_created_and_empty() {
    let app = TestApp::new();
    app.user("alice").await;
    app.forum("rust", "alice").await;
    app.thread("rust", "alice", Some("quiet")).await;

    let (status, posts) = app.post("/api/thread/quiet/create", json!([])).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posts, json!([]));

    let (status, _) = app.post("/api/thread/nowhere/create", json!([])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_parent_rejects_the_whole_batch() {
    let app = TestApp::new();
    app.user("alice").await;
    app.forum("rust", "alice").await;
    app.thread("rust", "alice", Some("one")).await;
    app.thread("rust", "alice", Some("two")).await;
    let foreign = app.posts("one", json!([root("alice")])).await[0];

    let (status, body) = app
        .post("/api/thread/two/create", json!([root("alice"), reply(foreign, "alice")]))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].is_string());

    let (_, posts) = app.get("/api/thread/two/posts").await;
    assert_eq!(posts, json!([]));
    let (_, status) = app.get("/api/service/status").await;
    assert_eq!(status["post"], 1);
}

#[tokio::test]
async fn unknown_author_or_parent() {
    let app = TestApp::new();
    app.user("alice").await;
    app.forum("rust", "alice").await;
    app.thread("rust", "alice", Some("t")).await;

    let (status, _) = app.post("/api/thread/t/create", json!([root("ghost")])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.post("/api/thread/t/create", json!([reply(999_999, "alice")])).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn vote_sequence_moves_the_aggregate_by_deltas() {
    let app = TestApp::new();
    app.user("alice").await;
    app.user("bob").await;
    app.forum("rust", "alice").await;
    let thread = app.thread("rust", "alice", Some("poll")).await;
    let by_id = format!("/api/thread/{}/vote", thread["id"]);

    let (status, after) = app.post("/api/thread/poll/vote", json!({ "nickname": "alice", "voice": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["votes"], 1);

    // the same voice again is a no-op, whichever way the thread is named
    let (_, after) = app.post(&by_id, json!({ "nickname": "ALICE", "voice": 1 })).await;
    assert_eq!(after["votes"], 1);

    let (_, after) = app.post(&by_id, json!({ "nickname": "bob", "voice": 1 })).await;
    assert_eq!(after["votes"], 2);

    let (_, after) = app.post("/api/thread/POLL/vote", json!({ "nickname": "alice", "voice": -1 })).await;
    assert_eq!(after["votes"], 0);

    let (_, details) = app.get("/api/thread/poll/details").await;
    assert_eq!(details["votes"], 0);
}

#[tokio::test]
async fn vote_validation() {
    let app = TestApp::new();
    app.user("alice").await;
    app.forum("rust", "alice").await;
    app.thread("rust", "alice", Some("poll")).await;

    let (status, _) = app.post("/api/thread/poll/vote", json!({ "nickname": "alice", "voice": 2 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.post("/api/thread/poll/vote", json!({ "nickname": "ghost", "voice": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post("/api/thread/nope/vote", json!({ "nickname": "alice", "voice": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resolver_prefers_slug_over_id() {
    let app = TestApp::new();
    app.user("alice").await;
    app.forum("rust", "alice").await;
    let first = app.thread("rust", "alice", None).await;
    let id = first["id"].as_i64().unwrap();
    let shadow = app.thread("rust", "alice", Some(&id.to_string())).await;

    let (_, resolved) = app.get(&format!("/api/thread/{id}/details")).await;
    assert_eq!(resolved["id"], shadow["id"]);

    let (_, resolved) = app.get(&format!("/api/thread/{}/details", shadow["id"])).await;
    assert_eq!(resolved["id"], shadow["id"]);
}

#[tokio::test]
async fn thread_update_ignores_blank_fields() {
    let app = TestApp::new();
    app.user("alice").await;
    app.forum("rust", "alice").await;
    app.thread("rust", "alice", Some("edit")).await;

    let (status, thread) = app
        .post("/api/thread/edit/details", json!({ "title": "Renamed", "message": "" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread["title"], "Renamed");
    assert_eq!(thread["message"], "first");

    let (status, unchanged) = app.post("/api/thread/edit/details", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged, thread);
}
