pub mod api;

use std::{any::Any, path::Path};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::{ServeDir, ServeFile},
};
use tracing::error;

use crate::state::AppState;
use api::ErrorBody;

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// `GET /` and unmatched paths are served from `static_dir`.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route("/api/repos", get(api::repos::index::handler))
        .route(
            "/api/contact",
            post(api::contact::index::handler)
                .layer(CatchPanicLayer::custom(unexpected_failure)),
        )
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

fn unexpected_failure(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    error!(detail, "Contact handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new(UNEXPECTED_ERROR)),
    )
        .into_response()
}
