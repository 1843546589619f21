//! Shared harness for the HTTP tests: a router over a fresh in-memory store
//! plus a few fixtures.
#![cfg(feature = "web-axum")]

use std::sync::Arc;

use api_adapters::web::{self, AppState};
use api_adapters::Metrics;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use domains::listing::DEFAULT_LIMIT;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use storage_adapters::MemoryStore;
use tower::ServiceExt;

pub struct TestApp {
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::from_store(Arc::new(MemoryStore::new()), Arc::new(Metrics::new()), DEFAULT_LIMIT);
        Self { router: web::router(state) }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|value| Body::from(value.to_string())).unwrap_or_else(Body::empty);
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        let response = self.send(request).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body)).await
    }

    // ── Fixtures ────────────────────────────────────────────────────────────

    pub async fn user(&self, nickname: &str) -> Value {
        let (status, user) = self
            .post(
                &format!("/api/user/{nickname}/create"),
                json!({ "fullname": nickname, "about": "", "email": format!("{nickname}@example.org") }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{user}");
        user
    }

    pub async fn forum(&self, slug: &str, owner: &str) -> Value {
        let (status, forum) = self
            .post("/api/forum/create", json!({ "title": slug, "user": owner, "slug": slug }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{forum}");
        forum
    }

    pub async fn thread(&self, forum: &str, author: &str, slug: Option<&str>) -> Value {
        let mut body = json!({ "title": "Thread", "author": author, "message": "first" });
        if let Some(slug) = slug {
            body["slug"] = json!(slug);
        }
        let (status, thread) = self.post(&format!("/api/forum/{forum}/create"), body).await;
        assert_eq!(status, StatusCode::CREATED, "{thread}");
        thread
    }

    /// Posts one batch and returns the created post ids in order.
    pub async fn posts(&self, thread: &str, batch: Value) -> Vec<i64> {
        let (status, posts) = self.post(&format!("/api/thread/{thread}/create"), batch).await;
        assert_eq!(status, StatusCode::CREATED, "{posts}");
        ids(&posts)
    }
}

/// The `id` field of every element of a JSON array.
pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .map(|items| items.iter().filter_map(|item| item["id"].as_i64()).collect())
        .unwrap_or_default()
}

pub fn reply(parent: i64, author: &str) -> Value {
    json!({ "parent": parent, "author": author, "message": format!("reply to {parent}") })
}

pub fn root(author: &str) -> Value {
    json!({ "author": author, "message": "top level" })
}
