use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::services::tools::{compensated_resistance, ConductorMaterial, ResistanceResult};
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResistanceQuery {
    pub material: ConductorMaterial,
    /// Resistance measured at operating temperature, in ohms
    pub r_hot: f64,
    /// Operating temperature, in degrees Celsius
    pub t_hot: f64,
    /// Standard temperature to convert to (typically 20), in degrees Celsius
    pub t_std: f64,
}

#[utoipa::path(
    get,
    path = "/api/v1/tools/resistance",
    summary = "Temperature-compensated resistance",
    params(
        ("material" = String, Query, description = "Conductor material: copper or aluminum"),
        ("r_hot" = f64, Query, description = "Measured resistance (ohms)"),
        ("t_hot" = f64, Query, description = "Measurement temperature (C)"),
        ("t_std" = f64, Query, description = "Standard temperature (C)"),
    ),
    responses(
        (status = 200, description = "Converted resistance", body = ApiResponse<ResistanceResult>),
        (status = 400, description = "Degenerate input", body = crate::errors::ErrorResponse),
    )
)]
pub async fn resistance(
    State(_state): State<AppState>,
    Query(query): Query<ResistanceQuery>,
) -> Result<Json<ApiResponse<ResistanceResult>>, ServiceError> {
    let result = compensated_resistance(query.material, query.r_hot, query.t_hot, query.t_std)?;
    Ok(Json(ApiResponse::success(result)))
}
