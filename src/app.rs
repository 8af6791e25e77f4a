use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Every path goes through the shell's route table, so axum only needs a catch-all.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::show).post(handlers::submit))
        .route("/*path", get(handlers::show).post(handlers::submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
