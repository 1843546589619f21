use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{NewPost, Post, Thread, ThreadUpdate, VoteRequest};

use super::PageQuery;
use crate::web::error::ApiError;
use crate::web::state::AppState;

// The thread is resolved before the body or query is inspected, so an
// unknown thread is a 404 even when the request is malformed.

/// `POST /thread/{slug_or_id}/create`: an atomic batch of posts.
pub async fn create_posts(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Result<Json<Vec<NewPost>>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Post>>), ApiError> {
    let thread = state.threads.resolve(&token).await?;
    let Json(entries) = body?;
    let posts = state.threads.create_posts(&thread, entries).await?;
    state.metrics.record_posts(posts.len());
    Ok((StatusCode::CREATED, Json(posts)))
}

pub async fn vote(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<Thread>, ApiError> {
    let thread = state.threads.resolve(&token).await?;
    let Json(request) = body?;
    let (thread, transition) = state.threads.vote(&thread, request).await?;
    state.metrics.record_vote(transition);
    Ok(Json(thread))
}

pub async fn details(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Thread>, ApiError> {
    Ok(Json(state.threads.resolve(&token).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Result<Json<ThreadUpdate>, JsonRejection>,
) -> Result<Json<Thread>, ApiError> {
    let Json(update) = body?;
    Ok(Json(state.threads.update(&token, update).await?))
}

/// `GET /thread/{slug_or_id}/posts?sort=&since=&limit=&desc=`
pub async fn posts(
    State(state): State<AppState>,
    Path(token): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let thread = state.threads.resolve(&token).await?;
    let Query(query) = query?;
    let listing = query.posts(state.default_limit)?;
    Ok(Json(state.threads.posts(&thread, listing).await?))
}
