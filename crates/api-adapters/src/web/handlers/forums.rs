use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::{Creation, Forum, NewForum, NewThread, Thread, User};

use super::PageQuery;
use crate::web::error::ApiError;
use crate::web::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<NewForum>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    Ok(match state.forums.create(request).await? {
        Creation::Created(forum) => (StatusCode::CREATED, Json(forum)).into_response(),
        Creation::Existing(forum) => (StatusCode::CONFLICT, Json(forum)).into_response(),
    })
}

pub async fn details(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Forum>, ApiError> {
    Ok(Json(state.forums.details(&slug).await?))
}

/// `POST /forum/{slug}/create` opens a thread in the forum.
pub async fn create_thread(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Result<Json<NewThread>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    Ok(match state.threads.create(&slug, request).await? {
        Creation::Created(thread) => (StatusCode::CREATED, Json(thread)).into_response(),
        Creation::Existing(thread) => (StatusCode::CONFLICT, Json(thread)).into_response(),
    })
}

pub async fn threads(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<Thread>>, ApiError> {
    let Query(query) = query?;
    let listing = query.threads(state.default_limit)?;
    Ok(Json(state.forums.threads(&slug, listing).await?))
}

pub async fn users(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>, ApiError> {
    let Query(query) = query?;
    let listing = query.users(state.default_limit)?;
    Ok(Json(state.forums.users(&slug, listing).await?))
}
