use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Inferred-temperature constant `k` of the conductor material, in degrees
/// Celsius. Standard values for annealed copper and aluminum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConductorMaterial {
    Copper,
    Aluminum,
}

impl ConductorMaterial {
    pub fn temperature_constant(&self) -> f64 {
        match self {
            Self::Copper => 234.5,
            Self::Aluminum => 228.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResistanceResult {
    pub material: ConductorMaterial,
    pub r_hot: f64,
    pub t_hot: f64,
    pub t_std: f64,
    /// Resistance converted to the standard temperature.
    pub r_std: f64,
}

/// Converts a resistance measured at `t_hot` to its value at `t_std` using
/// `r_std = r_hot * (t_std + k) / (t_hot + k)`.
pub fn compensated_resistance(
    material: ConductorMaterial,
    r_hot: f64,
    t_hot: f64,
    t_std: f64,
) -> Result<ResistanceResult, ServiceError> {
    if !r_hot.is_finite() || !t_hot.is_finite() || !t_std.is_finite() {
        return Err(ServiceError::InvalidInput(
            "Resistance and temperatures must be finite numbers".to_string(),
        ));
    }
    if r_hot < 0.0 {
        return Err(ServiceError::InvalidInput(
            "Measured resistance must be non-negative".to_string(),
        ));
    }

    let k = material.temperature_constant();
    let denominator = t_hot + k;
    if denominator.abs() < f64::EPSILON {
        return Err(ServiceError::InvalidInput(
            "Measured temperature cancels the material constant".to_string(),
        ));
    }

    Ok(ResistanceResult {
        material,
        r_hot,
        t_hot,
        t_std,
        r_std: r_hot * (t_std + k) / denominator,
    })
}
