// src/handlers/portfolio.rs

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
        page::Page,
        portfolio::{
            CreatePortfolioRequest, Portfolio, PortfolioListParams, PortfolioView,
            UpdatePortfolioRequest,
        },
    },
    state::AppState,
    utils::{html::clean_html, jwt::Claims},
};

/// Create a new portfolio owned by the caller.
pub async fn create_portfolio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePortfolioRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let portfolio_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO portfolios (user_id, title, description, is_public)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(claims.user_id())
    .bind(clean_html(&payload.title))
    .bind(payload.description.as_deref().map(clean_html))
    .bind(payload.is_public)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create portfolio: {:?}", e);
        AppError::from(e)
    })?;

    state.cache.clear().await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": portfolio_id })),
    ))
}

/// Browse other users' public portfolios, with optional search over title,
/// description and owner name. Pages are cached per requesting user.
pub async fn list_portfolios(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PortfolioListParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let cache_key = format!(
        "portfolio_page_{}_take_{}_{}_search_{}_user_{}",
        params.page,
        params.take,
        params.order,
        params.search.as_deref().unwrap_or(""),
        user_id
    );

    if let Some(cached) = state.cache.get(&cache_key).await {
        if let Ok(page) = serde_json::from_value::<Page<PortfolioView>>(cached) {
            return Ok(Json(page));
        }
    }

    let skip = (params.page - 1) * params.take;

    let query = format!(
        r#"
        SELECT p.id, p.title, p.description, u.name AS owner_name, p.created_at
        FROM portfolios p
        JOIN users u ON u.id = p.user_id
        WHERE p.is_public = TRUE AND p.user_id <> $1
          AND ($2::TEXT IS NULL
               OR p.title ILIKE '%' || $2 || '%'
               OR p.description ILIKE '%' || $2 || '%'
               OR u.name ILIKE '%' || $2 || '%')
        ORDER BY p.created_at {}
        OFFSET $3 LIMIT $4
        "#,
        params.order.sql()
    );

    let portfolios = sqlx::query_as::<_, PortfolioView>(&query)
        .bind(user_id)
        .bind(params.search.as_deref())
        .bind(skip)
        .bind(params.take)
        .fetch_all(&state.pool)
        .await?;

    let item_count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM portfolios p
        JOIN users u ON u.id = p.user_id
        WHERE p.is_public = TRUE AND p.user_id <> $1
          AND ($2::TEXT IS NULL
               OR p.title ILIKE '%' || $2 || '%'
               OR p.description ILIKE '%' || $2 || '%'
               OR u.name ILIKE '%' || $2 || '%')
        "#,
    )
    .bind(user_id)
    .bind(params.search.as_deref())
    .fetch_one(&state.pool)
    .await?;

    let page = Page::new(portfolios, params.page, params.take, item_count);

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

/// List the caller's own portfolios, newest first.
pub async fn list_own_portfolios(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let portfolios = sqlx::query_as::<_, Portfolio>(
        r#"
        SELECT id, user_id, title, description, is_public, created_at
        FROM portfolios
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(portfolios))
}

/// Get a single portfolio by ID, including the owner's name.
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let portfolio = sqlx::query_as::<_, PortfolioView>(
        r#"
        SELECT p.id, p.title, p.description, u.name AS owner_name, p.created_at
        FROM portfolios p
        JOIN users u ON u.id = p.user_id
        WHERE p.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Portfolio not found".to_string()))?;

    Ok(Json(portfolio))
}

/// Update a portfolio. Absent fields keep their current value.
pub async fn update_portfolio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePortfolioRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    ensure_owner(&state, id, claims.user_id()).await?;

    let portfolio = sqlx::query_as::<_, Portfolio>(
        r#"
        UPDATE portfolios
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            is_public = COALESCE($4, is_public)
        WHERE id = $1
        RETURNING id, user_id, title, description, is_public, created_at
        "#,
    )
    .bind(id)
    .bind(payload.title.as_deref().map(clean_html))
    .bind(payload.description.as_deref().map(clean_html))
    .bind(payload.is_public)
    .fetch_one(&state.pool)
    .await?;

    state.cache.clear().await;

    Ok(Json(portfolio))
}

/// Delete a portfolio. Its media and their comment threads go with it.
pub async fn delete_portfolio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(&state, id, claims.user_id()).await?;

    sqlx::query("DELETE FROM portfolios WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete portfolio {}: {:?}", id, e);
            AppError::from(e)
        })?;

    state.cache.clear().await;

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_owner(state: &AppState, portfolio_id: i64, user_id: i64) -> Result<(), AppError> {
    let owner_id: Option<i64> = sqlx::query_scalar("SELECT user_id FROM portfolios WHERE id = $1")
        .bind(portfolio_id)
        .fetch_optional(&state.pool)
        .await?;

    let owner_id = owner_id.ok_or(AppError::NotFound("Portfolio not found".to_string()))?;

    if owner_id != user_id {
        return Err(AppError::Forbidden(
            "You do not have permission to modify this portfolio".to_string(),
        ));
    }

    Ok(())
}
