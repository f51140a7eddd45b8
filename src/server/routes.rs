use crate::server::{handlers, types::AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub fn create_router(state: AppState, body_limit: usize) -> Router {
    let uploads = ServeDir::new(state.uploads.dir());
    let state = Arc::new(state);

    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/model-status", get(handlers::model_status))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::render_metrics))
        .nest_service("/static/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
