// src/handlers/media.rs

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        media::{CreateMediaRequest, Media, MediaListParams, MediaView},
        page::Page,
    },
    state::AppState,
    utils::{html::clean_html, jwt::Claims},
};

/// Register a new media item under one of the caller's portfolios.
/// The file bytes live in external storage; only the metadata is recorded.
pub async fn create_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateMediaRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let owner_id: Option<i64> =
        sqlx::query_scalar("SELECT user_id FROM portfolios WHERE id = $1")
            .bind(payload.portfolio_id)
            .fetch_optional(&state.pool)
            .await?;

    let owner_id = owner_id.ok_or(AppError::NotFound("Portfolio not found".to_string()))?;

    if owner_id != user_id {
        return Err(AppError::Forbidden(
            "You are not the owner of this portfolio".to_string(),
        ));
    }

    let media_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO media (portfolio_id, name, description, path, is_public)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(payload.portfolio_id)
    .bind(clean_html(&payload.name))
    .bind(payload.description.as_deref().map(clean_html))
    .bind(&payload.path)
    .bind(payload.is_public)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create media: {:?}", e);
        AppError::from(e)
    })?;

    state.cache.clear().await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": media_id })),
    ))
}

/// List public media, optionally filtered by portfolio or a search term.
/// Pages are cached until the next mutation or TTL expiry.
pub async fn list_media(
    State(state): State<AppState>,
    Query(params): Query<MediaListParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let cache_key = format!(
        "media_page_{}_take_{}_{}_search_{}_portfolio_{}",
        params.page,
        params.take,
        params.order,
        params.search.as_deref().unwrap_or(""),
        params
            .portfolio_id
            .map(|id| id.to_string())
            .unwrap_or_default()
    );

    if let Some(cached) = state.cache.get(&cache_key).await {
        if let Ok(page) = serde_json::from_value::<Page<MediaView>>(cached) {
            return Ok(Json(page));
        }
    }

    let skip = (params.page - 1) * params.take;

    let query = format!(
        r#"
        SELECT m.id, m.portfolio_id, m.name, m.description, m.created_at
        FROM media m
        JOIN portfolios p ON p.id = m.portfolio_id
        WHERE m.is_public = TRUE AND p.is_public = TRUE
          AND ($1::BIGINT IS NULL OR m.portfolio_id = $1)
          AND ($2::TEXT IS NULL
               OR m.name ILIKE '%' || $2 || '%'
               OR m.description ILIKE '%' || $2 || '%')
        ORDER BY m.created_at {}
        OFFSET $3 LIMIT $4
        "#,
        params.order.sql()
    );

    let media = sqlx::query_as::<_, MediaView>(&query)
        .bind(params.portfolio_id)
        .bind(params.search.as_deref())
        .bind(skip)
        .bind(params.take)
        .fetch_all(&state.pool)
        .await?;

    let item_count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM media m
        JOIN portfolios p ON p.id = m.portfolio_id
        WHERE m.is_public = TRUE AND p.is_public = TRUE
          AND ($1::BIGINT IS NULL OR m.portfolio_id = $1)
          AND ($2::TEXT IS NULL
               OR m.name ILIKE '%' || $2 || '%'
               OR m.description ILIKE '%' || $2 || '%')
        "#,
    )
    .bind(params.portfolio_id)
    .bind(params.search.as_deref())
    .fetch_one(&state.pool)
    .await?;

    let page = Page::new(media, params.page, params.take, item_count);

    state
        .cache
        .set(
            &cache_key,
            serde_json::to_value(&page)?,
            Duration::from_secs(state.config.cache_ttl_secs),
        )
        .await;

    Ok(Json(page))
}

/// Get a single media item by ID.
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let media = sqlx::query_as::<_, Media>(
        r#"
        SELECT id, portfolio_id, name, description, path, is_public, created_at
        FROM media
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Media not found".to_string()))?;

    Ok(Json(media))
}

/// Delete a media item. Requires ownership of the enclosing portfolio.
/// Its comment thread goes with it.
pub async fn delete_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT p.user_id
        FROM media m
        JOIN portfolios p ON p.id = m.portfolio_id
        WHERE m.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    let owner_id = owner_id.ok_or(AppError::NotFound("Media not found".to_string()))?;

    if owner_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "You are not the owner of this media".to_string(),
        ));
    }

    sqlx::query("DELETE FROM media WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete media {}: {:?}", id, e);
            AppError::from(e)
        })?;

    state.cache.clear().await;

    Ok(StatusCode::NO_CONTENT)
}
