use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{AppError, Post, PostDetails, PostRelation, PostUpdate};
use serde::Deserialize;

use crate::web::error::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RelatedQuery {
    pub related: Option<String>,
}

/// A post id that is not a number cannot name any post.
fn post_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError(AppError::not_found("post", raw)))
}

pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RelatedQuery>,
) -> Result<Json<PostDetails>, ApiError> {
    let related = query.related.as_deref().map(PostRelation::parse_list).unwrap_or_default();
    Ok(Json(state.posts.details(post_id(&id)?, &related).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<PostUpdate>, JsonRejection>,
) -> Result<Json<Post>, ApiError> {
    let Json(update) = body?;
    Ok(Json(state.posts.update(post_id(&id)?, update).await?))
}
