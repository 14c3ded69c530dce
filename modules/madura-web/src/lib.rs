pub mod forms;
pub mod health;
pub mod pages;
pub mod settings;
pub mod state;
pub mod templates;
pub mod views;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

pub use health::{spawn_poller, BackendStatus};
pub use state::AppState;

use pages::*;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_json))
        // Fermenters
        .route("/maduradores", post(save_madurador))
        .route("/maduradores/new", get(new_madurador))
        .route("/maduradores/{id}", get(madurador_detail))
        .route("/maduradores/{id}/edit", get(edit_madurador))
        .route("/maduradores/{id}/delete", post(delete_madurador))
        // Batches
        .route("/lotes", post(save_lote))
        .route("/lotes/new", get(new_lote))
        .route("/lotes/{id}", get(lote_detail))
        .route("/lotes/{id}/edit", get(edit_lote))
        .route("/lotes/{id}/delete", post(delete_lote))
        .route("/settings", get(settings_page).post(save_settings))
        .with_state(state)
        // Every view is a fresh read of the backend
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
