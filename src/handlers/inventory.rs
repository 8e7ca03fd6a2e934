use axum::{extract::State, http::StatusCode, response::Json};

use crate::models::Product;
use crate::services::inventory::AddProductRequest;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    summary = "List catalog products",
    responses((status = 200, description = "Products retrieved", body = ApiResponse<Vec<Product>>))
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ServiceError> {
    let products = state.services.inventory.list_products().await;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    summary = "Add catalog product",
    request_body = AddProductRequest,
    responses(
        (status = 201, description = "Product added", body = ApiResponse<Product>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn add_product(
    State(state): State<AppState>,
    Json(payload): Json<AddProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ServiceError> {
    let product = state.services.inventory.add_product(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}
