use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::auth::{
    ChangeAdminPasswordRequest, LoginRequest, SetTechnicianPasswordRequest,
};
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoginRole {
    Admin,
    Technician,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub name: String,
    pub role: LoginRole,
}

/// The login name "admin" (case-insensitive) is checked against the admin
/// password record; any other name is treated as a technician principal.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    summary = "Log in as admin or technician",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login accepted", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ServiceError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("Name is required".to_string()));
    }

    let role = if name.eq_ignore_ascii_case("admin") {
        state
            .services
            .auth
            .verify_admin_password(&payload.password)
            .await?;
        LoginRole::Admin
    } else {
        state
            .services
            .auth
            .verify_technician_password(&name, &payload.password)
            .await?;
        LoginRole::Technician
    };

    Ok(Json(ApiResponse::success(LoginResponse { name, role })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/admin/password",
    summary = "Change admin password",
    description = "The current password must verify before the new one is stored",
    request_body = ChangeAdminPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<String>),
        (status = 401, description = "Current password rejected", body = crate::errors::ErrorResponse),
    )
)]
pub async fn change_admin_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangeAdminPasswordRequest>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    state.services.auth.change_admin_password(payload).await?;
    Ok(Json(ApiResponse::success(
        "Admin password changed".to_string(),
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/technicians/{name}/password",
    summary = "Set a technician's password",
    params(("name" = String, Path, description = "Technician name")),
    request_body = SetTechnicianPasswordRequest,
    responses(
        (status = 200, description = "Password stored", body = ApiResponse<String>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn set_technician_password(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<SetTechnicianPasswordRequest>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    state
        .services
        .auth
        .set_technician_password(&name, payload)
        .await?;
    Ok(Json(ApiResponse::success(format!(
        "Password set for {}",
        name
    ))))
}
