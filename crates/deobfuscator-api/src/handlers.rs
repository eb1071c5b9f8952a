//! API request handlers for deobfuscation

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use moonsec_common::{DeobfuscationRequest, DeobfuscationResult, Error, HealthReport};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::AppState;

/// Lua program returned by `GET /test`
pub const SAMPLE_LUA: &str = r#"local chars = { "H", "e", "l", "l", "o ", "W", "o", "r", "l", "d", "!" }
local result = ""
for i = 1, #chars do
    result = result .. chars[i]
end
print(result)"#;

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = DeobfuscationResult::failed(self.message);

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        };

        ApiError {
            status,
            message: format!("Invalid JSON body: {}", rejection.body_text()),
        }
    }
}

/// Service descriptor
pub async fn index_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Moonsec Deobfuscator API",
        "version": "1.0.0",
        "status": "running"
    }))
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let toolchain = state.toolchain();
    let moonsec_exists = toolchain.tool_dir_exists();

    Json(HealthReport {
        status: "ok".to_string(),
        dotnet: toolchain.prerequisite_available().await,
        moonsec_path: toolchain.config().tool_dir.display().to_string(),
        moonsec_exists,
        timestamp: if moonsec_exists {
            toolchain.tool_dir_modified().unwrap_or(0.0)
        } else {
            0.0
        },
    })
}

/// Smoke-test endpoint with a sample Lua program
pub async fn test_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "test": "Moonsec API is working",
        "sample": SAMPLE_LUA,
        "endpoints": {
            "POST /deobfuscate": "Deobfuscate Lua code",
            "GET /health": "Check system health",
            "GET /test": "This test endpoint"
        }
    }))
}

/// Run the external deobfuscator on the submitted content
pub async fn deobfuscate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeobfuscationRequest>, JsonRejection>,
) -> Result<Json<DeobfuscationResult>, ApiError> {
    let request_id = Uuid::new_v4();

    let Json(request) = payload.map_err(|rejection| {
        warn!(%request_id, "Rejected request body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    info!(
        %request_id,
        "Deobfuscating {} as {:?}",
        request.original_filename(),
        request.format()
    );

    match state.deobfuscator.run(&request).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            if e.is_client_error() {
                warn!(%request_id, "Invalid request: {}", e);
            } else {
                error!(%request_id, "Deobfuscation request failed: {}", e);
            }
            Err(e.into())
        }
    }
}
