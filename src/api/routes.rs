use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;

use super::auth::auth_middleware;
use super::handlers::{
    create_batch, create_json, create_text, delete_user_urls, ping, redirect, user_urls, AppState,
};
use super::middleware::log_request;

pub fn create_router(state: Arc<AppState>) -> Router {
    let keys = Arc::clone(&state.keys);

    let identified_routes = Router::new()
        .route("/", post(create_text))
        .route("/{id}", get(redirect))
        .route("/api/shorten", post(create_json))
        .route("/api/shorten/batch", post(create_batch))
        .route("/api/user/urls", get(user_urls).delete(delete_user_urls))
        .route_layer(middleware::from_fn_with_state(keys, auth_middleware))
        .with_state(Arc::clone(&state));

    Router::new()
        .route("/ping", get(ping))
        .with_state(state)
        .merge(identified_routes)
        .layer(middleware::from_fn(log_request))
        .layer(CompressionLayer::new())
        .layer(RequestDecompressionLayer::new())
}
