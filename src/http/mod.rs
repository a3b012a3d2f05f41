//! HTTP surface.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /upload/image` | [`upload::upload_image`]: thumbnails, compression, watermark |
//! | `POST /upload/file` | [`upload::upload_file`]: store parts unmodified |
//! | `GET /*` | static files from the storage directory |
//!
//! CORS is permissive and the body limit comes from `upload.max_request_bytes`.

pub mod error;
pub mod upload;

use crate::config::ServiceConfig;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.config.storage_dir());
    let body_limit = state.config.upload.max_request_bytes;

    Router::new()
        .route("/upload/image", post(upload::upload_image))
        .route("/upload/file", post(upload::upload_file))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
