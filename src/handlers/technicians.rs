use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Technician;
use crate::services::technicians::AddTechnicianRequest;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct RemovedResponse {
    pub id: String,
    pub removed: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/technicians",
    summary = "List technicians",
    responses((status = 200, description = "Technicians retrieved", body = ApiResponse<Vec<Technician>>))
)]
pub async fn list_technicians(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Technician>>>, ServiceError> {
    let technicians = state.services.technicians.list_technicians().await;
    Ok(Json(ApiResponse::success(technicians)))
}

#[utoipa::path(
    post,
    path = "/api/v1/technicians",
    summary = "Add technician",
    request_body = AddTechnicianRequest,
    responses(
        (status = 201, description = "Technician added", body = ApiResponse<Technician>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn add_technician(
    State(state): State<AppState>,
    Json(payload): Json<AddTechnicianRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Technician>>), ServiceError> {
    let technician = state.services.technicians.add_technician(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(technician))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/technicians/{id}",
    summary = "Remove technician",
    params(("id" = String, Path, description = "Technician id")),
    responses((status = 200, description = "Technician removed", body = ApiResponse<RemovedResponse>))
)]
pub async fn remove_technician(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RemovedResponse>>, ServiceError> {
    let removed = state.services.technicians.remove_technician(&id).await;
    Ok(Json(ApiResponse::success(RemovedResponse { id, removed })))
}
