use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::services::dashboard::DashboardReport;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct DashboardQuery {
    /// Restrict every aggregate to orders created in this calendar year
    pub year: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    summary = "Dashboard aggregates",
    description = "Revenue, status, monthly and per-technician aggregates over all order lines",
    params(("year" = Option<i32>, Query, description = "Calendar year filter")),
    responses((status = 200, description = "Report computed", body = ApiResponse<DashboardReport>))
)]
pub async fn report(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardReport>>, ServiceError> {
    let report = state.services.dashboard.report(query.year).await;
    Ok(Json(ApiResponse::success(report)))
}
