use super::{handlers, state::AppState};
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// Assembles the application router with request tracing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/currencies", get(handlers::currencies))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
