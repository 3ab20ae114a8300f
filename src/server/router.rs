use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{admin, chat, health};
use crate::state::AppState;

/// Creates the application router: health, chat, the bearer-guarded admin
/// routes, and the optional static site as fallback.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.settings.max_upload_bytes;
    let public_dir = state.settings.public_dir.clone();

    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/api/chat", post(chat::chat))
        .route(
            "/api/admin/sources",
            get(admin::list_sources).delete(admin::delete_source),
        )
        .route("/api/admin/upload", post(admin::upload))
        .route("/api/admin/urls", post(admin::add_url))
        .route("/api/admin/rebuild", post(admin::rebuild))
        .with_state(state);

    if let Some(dir) = public_dir {
        tracing::info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
