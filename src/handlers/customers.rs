use axum::{extract::State, http::StatusCode, response::Json};

use crate::models::Customer;
use crate::services::customers::AddCustomerRequest;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    summary = "List customers",
    responses((status = 200, description = "Customers retrieved", body = ApiResponse<Vec<Customer>>))
)]
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Customer>>>, ServiceError> {
    let customers = state.services.customers.list_customers().await;
    Ok(Json(ApiResponse::success(customers)))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    summary = "Add customer",
    request_body = AddCustomerRequest,
    responses(
        (status = 201, description = "Customer added", body = ApiResponse<Customer>),
        (status = 409, description = "Customer already exists", body = crate::errors::ErrorResponse),
    )
)]
pub async fn add_customer(
    State(state): State<AppState>,
    Json(payload): Json<AddCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), ServiceError> {
    let customer = state.services.customers.add_customer(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}
