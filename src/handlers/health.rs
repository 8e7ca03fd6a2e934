use axum::{extract::State, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::store::ConnectionState;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// "connected" while the remote store is in use, "local-only" after the
    /// latch (or when no remote was configured)
    pub connection: &'static str,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "Service health and connection state",
    responses((status = 200, description = "Service is up", body = ApiResponse<HealthResponse>))
)]
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthResponse>>, ServiceError> {
    let connection = match state.store.connection_state() {
        ConnectionState::Connected => "connected",
        ConnectionState::LocalOnly => "local-only",
    };

    Ok(Json(ApiResponse::success(HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        connection,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })))
}
