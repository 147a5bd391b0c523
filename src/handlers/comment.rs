// src/handlers/comment.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{ChildCommentsParams, CreateCommentRequest, RootCommentsParams},
    state::AppState,
    utils::jwt::Claims,
};

/// Create a comment: a root comment on a media item, or a reply to a root.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !payload.has_single_target() {
        return Err(AppError::BadRequest(
            "Exactly one of media_id or parent_comment_id must be provided".to_string(),
        ));
    }

    let comment = state.comments.create(payload, claims.user_id()).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": comment.id })),
    ))
}

/// Paginated root comments of a media item.
pub async fn list_root_comments(
    State(state): State<AppState>,
    Query(params): Query<RootCommentsParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let page = state.comments.find_roots_paginated(&params).await?;

    Ok(Json(page))
}

/// Paginated replies of a root comment, oldest first.
pub async fn list_child_comments(
    State(state): State<AppState>,
    Path(parent_id): Path<i64>,
    Query(params): Query<ChildCommentsParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let page = state
        .comments
        .find_children_by_parent(parent_id, params.page, params.take)
        .await?;

    Ok(Json(page))
}

/// Fetch a single comment by ID.
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comment = state.comments.find_one(id, None).await?;

    Ok(Json(comment))
}

/// Delete a comment. Only the author may delete it.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.comments.remove(id, claims.user_id()).await?;

    Ok(StatusCode::NO_CONTENT)
}
