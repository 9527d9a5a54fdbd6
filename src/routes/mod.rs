//! Route modules for Promptbook Server

pub mod chat;
pub mod ocr;
pub mod prompts;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Assemble the full application router. Shared by the binary and the
/// integration tests.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/ocr", ocr::router())
        .nest("/chat", chat::router())
        .nest("/api/v1/prompts", prompts::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
