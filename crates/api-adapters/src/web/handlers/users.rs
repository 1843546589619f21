use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::{Creation, User, UserProfile, UserUpdate};

use crate::web::error::ApiError;
use crate::web::state::AppState;

/// `POST /user/{nickname}/create`. A taken nickname or email answers 409
/// with every user it collides with.
pub async fn create(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
    body: Result<Json<UserProfile>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(profile) = body?;
    Ok(match state.users.create(&nickname, profile).await? {
        Creation::Created(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Creation::Existing(users) => (StatusCode::CONFLICT, Json(users)).into_response(),
    })
}

pub async fn profile(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.profile(&nickname).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(update) = body?;
    Ok(Json(state.users.update(&nickname, update).await?))
}
