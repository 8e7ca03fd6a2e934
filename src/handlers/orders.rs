use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{CalibrationStatus, OrderLine};
use crate::services::orders::{CreateOrderRequest, OrderGroup};
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct ExistsResponse {
    pub order_number: String,
    pub exists: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNotesRequest {
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTargetDateRequest {
    pub target_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RestoreOrderRequest {
    #[validate(length(min = 1, message = "Restore reason is required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteOrderRequest {
    pub admin_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub order_number: String,
    pub deleted_lines: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List order lines",
    description = "Every order line, newest first",
    responses(
        (status = 200, description = "Order lines retrieved", body = ApiResponse<Vec<OrderLine>>),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OrderLine>>>, ServiceError> {
    let lines = state.services.orders.list_orders().await;
    Ok(Json(ApiResponse::success(lines)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/groups",
    summary = "List order groups",
    description = "Order lines grouped by order number with summed totals",
    responses(
        (status = 200, description = "Order groups retrieved", body = ApiResponse<Vec<OrderGroup>>),
    )
)]
pub async fn list_order_groups(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OrderGroup>>>, ServiceError> {
    let groups = state.services.orders.list_order_groups().await;
    Ok(Json(ApiResponse::success(groups)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_number}/exists",
    summary = "Check order number availability",
    params(("order_number" = String, Path, description = "Order number to check")),
    responses(
        (status = 200, description = "Existence check result", body = ApiResponse<ExistsResponse>),
    )
)]
pub async fn order_number_exists(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<ApiResponse<ExistsResponse>>, ServiceError> {
    let exists = state.services.orders.order_number_exists(&order_number).await;
    Ok(Json(ApiResponse::success(ExistsResponse {
        order_number,
        exists,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Expands the cart into one line per item, all sharing the order number",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<Vec<OrderLine>>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order number already exists", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<OrderLine>>>), ServiceError> {
    let lines = state.services.orders.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(lines))))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{order_number}/status",
    summary = "Update group status",
    description = "Applies to every line sharing the order number; Completed also archives the group",
    params(("order_number" = String, Path, description = "Order number")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<String>),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    payload.validate()?;
    let status = CalibrationStatus::parse(&payload.status).ok_or_else(|| {
        ServiceError::InvalidStatus(format!("Unknown calibration status: {}", payload.status))
    })?;

    state.services.orders.update_status(&order_number, status).await;
    Ok(Json(ApiResponse::success(format!(
        "Order {} set to {}",
        order_number, status
    ))))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{order_number}/notes",
    summary = "Update group notes",
    params(("order_number" = String, Path, description = "Order number")),
    request_body = UpdateNotesRequest,
    responses((status = 200, description = "Notes updated", body = ApiResponse<String>))
)]
pub async fn update_notes(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(payload): Json<UpdateNotesRequest>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    state
        .services
        .orders
        .update_notes(&order_number, &payload.notes)
        .await;
    Ok(Json(ApiResponse::success(format!(
        "Notes updated for order {}",
        order_number
    ))))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{order_number}/target-date",
    summary = "Update group target date",
    params(("order_number" = String, Path, description = "Order number")),
    request_body = UpdateTargetDateRequest,
    responses((status = 200, description = "Target date updated", body = ApiResponse<String>))
)]
pub async fn update_target_date(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(payload): Json<UpdateTargetDateRequest>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    state
        .services
        .orders
        .update_target_date(&order_number, payload.target_date)
        .await;
    Ok(Json(ApiResponse::success(format!(
        "Target date updated for order {}",
        order_number
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{order_number}/restore",
    summary = "Restore an archived order",
    description = "Clears the archived flag, resets status to Pending, and records the reason",
    params(("order_number" = String, Path, description = "Order number")),
    request_body = RestoreOrderRequest,
    responses(
        (status = 200, description = "Order restored", body = ApiResponse<String>),
        (status = 400, description = "Missing reason", body = crate::errors::ErrorResponse),
    )
)]
pub async fn restore_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(payload): Json<RestoreOrderRequest>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    payload.validate()?;
    state
        .services
        .orders
        .restore(&order_number, payload.reason.trim())
        .await;
    Ok(Json(ApiResponse::success(format!(
        "Order {} restored",
        order_number
    ))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{order_number}",
    summary = "Delete an order group",
    description = "Removes every line for the order number; requires the admin password",
    params(("order_number" = String, Path, description = "Order number")),
    request_body = DeleteOrderRequest,
    responses(
        (status = 200, description = "Order deleted", body = ApiResponse<DeletedResponse>),
        (status = 401, description = "Admin password rejected", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(payload): Json<DeleteOrderRequest>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ServiceError> {
    state
        .services
        .auth
        .verify_admin_password(&payload.admin_password)
        .await?;

    let deleted_lines = state.services.orders.delete(&order_number).await;
    Ok(Json(ApiResponse::success(DeletedResponse {
        order_number,
        deleted_lines,
    })))
}
