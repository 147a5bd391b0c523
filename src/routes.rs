// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, comment, media, portfolio},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, comments, media, portfolios).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, services).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let comment_routes = Router::new()
        .route("/", post(comment::create_comment))
        .route("/roots", get(comment::list_root_comments))
        .route("/{parent_id}/children", get(comment::list_child_comments))
        .route(
            "/{id}",
            get(comment::get_comment).delete(comment::delete_comment),
        );

    let media_routes = Router::new()
        .route("/", get(media::list_media).post(media::create_media))
        .route("/{id}", get(media::get_media).delete(media::delete_media));

    let portfolio_routes = Router::new()
        .route(
            "/",
            get(portfolio::list_portfolios).post(portfolio::create_portfolio),
        )
        .route("/mine", get(portfolio::list_own_portfolios))
        .route(
            "/{id}",
            get(portfolio::get_portfolio)
                .put(portfolio::update_portfolio)
                .delete(portfolio::delete_portfolio),
        );

    // Everything except register/login requires a valid bearer token.
    let protected_routes = Router::new()
        .nest("/comments", comment_routes)
        .nest("/media", media_routes)
        .nest("/portfolios", portfolio_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
