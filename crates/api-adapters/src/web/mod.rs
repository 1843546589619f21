//! # HTTP API
//!
//! axum router for the forum API. Routes live under `/api`; `/metrics`
//! serves the Prometheus registry.
//!
//! Layer stack, outermost first: request id assignment, per-request tracing
//! span, request id propagation, compression, CORS. Matched routes are also
//! counted in the `forum_http_requests` metric.

use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderName;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use handlers::{forums, posts, service, threads, users};

const REQUEST_ID: &str = "x-request-id";

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/user/{nickname}/create", post(users::create))
        .route("/user/{nickname}/profile", get(users::profile).post(users::update))
        .route("/forum/create", post(forums::create))
        .route("/forum/{slug}/details", get(forums::details))
        .route("/forum/{slug}/create", post(forums::create_thread))
        .route("/forum/{slug}/threads", get(forums::threads))
        .route("/forum/{slug}/users", get(forums::users))
        .route("/post/{id}/details", get(posts::details).post(posts::update))
        .route("/service/status", get(service::status))
        .route("/service/clear", post(service::clear))
        .route("/thread/{slug_or_id}/create", post(threads::create_posts))
        .route("/thread/{slug_or_id}/vote", post(threads::vote))
        .route("/thread/{slug_or_id}/details", get(threads::details).post(threads::update))
        .route("/thread/{slug_or_id}/posts", get(threads::posts))
}

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_default();
    let response = next.run(request).await;
    state.metrics.record_request(&method, &route, response.status().as_u16());
    response
}

/// Builds the complete application: routes, metrics and the tower-http stack.
pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    Router::new()
        .nest("/api", api_routes())
        .route("/metrics", get(service::metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let id = request
                        .headers()
                        .get(REQUEST_ID)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default();
                    info_span!(
                        "http",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %id,
                    )
                }))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
