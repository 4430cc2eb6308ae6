use crate::handler::GenerateService;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use gamesense_core::api::{ErrorCategory, GenerateRequest, GenerateResponse, INVALID_BODY_MESSAGE};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub fn router(service: Arc<GenerateService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/generate-content", post(generate_content))
        .route("/health", get(health))
        .layer(cors)
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate_content(
    State(service): State<Arc<GenerateService>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> (StatusCode, Json<GenerateResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            log::debug!("Rejected request body: {}", rejection.body_text());
            return failure(ErrorCategory::BadRequest(INVALID_BODY_MESSAGE.to_string()));
        }
    };

    match service.handle(request).await {
        Ok(text) => (StatusCode::OK, Json(GenerateResponse::success(text))),
        Err(err) => {
            let category = err.category();
            if category.status_code() >= 500 {
                log::error!("Generation failed: {}", err);
            } else {
                log::debug!("Bad request: {}", err);
            }
            failure(category)
        }
    }
}

fn failure(category: ErrorCategory) -> (StatusCode, Json<GenerateResponse>) {
    let status =
        StatusCode::from_u16(category.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(category.to_response()))
}
