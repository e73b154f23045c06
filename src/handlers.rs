use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{AppError, AppResult};
use crate::resolver::{AllocationResolver, BatchResult};

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub addresses: Vec<String>,
    pub decimals: Option<u8>,
}

pub fn create_router(resolver: Arc<AllocationResolver>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/check", post(check_allocations))
        .with_state(resolver)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn check_allocations(
    State(resolver): State<Arc<AllocationResolver>>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> AppResult<Json<BatchResult>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let result = resolver.resolve(&request.addresses, request.decimals).await?;

    Ok(Json(result))
}
