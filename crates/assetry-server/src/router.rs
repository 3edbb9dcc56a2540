use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all file endpoints.
///
/// `body_limit` caps the whole request body, multipart framing included.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/files",
            get(handler::list_files).post(handler::create_file),
        )
        .route(
            "/v1/files/:id",
            get(handler::fetch_file)
                .patch(handler::update_file)
                .delete(handler::delete_file),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
