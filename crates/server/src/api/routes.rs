use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{archives, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let archive = state.config().archive.clone();
    let metrics_state = Arc::clone(&state);

    // API routes
    let api_routes = Router::new()
        // Health, config and status
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        // Archives
        .route("/archives", post(archives::create_archive))
        .route("/archives", get(archives::list_archives))
        .route("/archives/{id}", get(archives::get_archive))
        .route("/archives/{id}/files", post(archives::add_files))
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .nest_service(
            archive.public_path.trim_end_matches('/'),
            ServeDir::new(&archive.dir),
        )
        .layer(middleware::from_fn_with_state(
            metrics_state,
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
