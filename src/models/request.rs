use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::lenient::{self, Field};

// ─── POST /api/simulate body ─────────────────────────────────────────────────

/// Simulation request. Temperatures are °F; every number may also be sent as
/// a numeric string. Absent or unreadable fields take the configured default.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    /// Collector area (m²)
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 2.0)]
    pub area: Field<f64>,
    /// Plate efficiency factor F′ [0..1]
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 0.8)]
    pub efficiency: Field<f64>,
    /// Cloud cover fraction [0..1]
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub cloud_cover: Field<f64>,
    /// Fluid specific heat (J/(kg·K))
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 4186.0)]
    pub specific_heat: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub transmittance: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub absorptance: Field<f64>,
    /// U_L (W/(m²·K))
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 8.0)]
    pub heat_loss_coefficient: Field<f64>,
    /// Pump power (W)
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 50.0)]
    pub pump_power: Field<f64>,
    /// Hydraulic head (m)
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 5.0)]
    pub hydraulic_head: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 0.7)]
    pub pump_efficiency: Field<f64>,
    /// Tank volume (m³)
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub tank_volume: Field<f64>,
    /// °F
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 59.0)]
    pub min_ambient_temp: Field<f64>,
    /// °F
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 77.0)]
    pub max_ambient_temp: Field<f64>,
    /// Fixed ambient temperature for every hour (°F); replaces min/max.
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub ambient_temp: Field<f64>,
    /// °F
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 68.0)]
    pub initial_fluid_temp: Field<f64>,
    /// °F
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>, example = 68.0)]
    pub initial_tank_temp: Field<f64>,
    /// Hour of day of step 0 (0..=23)
    #[serde(default, deserialize_with = "lenient::integer")]
    #[schema(value_type = Option<u32>)]
    pub start_hour: Field<i64>,
    /// Index one past the last step simulated
    #[serde(default, deserialize_with = "lenient::integer")]
    #[schema(value_type = Option<u32>, example = 24)]
    pub duration: Field<i64>,
    /// First step simulated; defaults to 0
    #[serde(default, deserialize_with = "lenient::integer")]
    #[schema(value_type = Option<u32>)]
    pub start_step: Field<i64>,
    /// Overrides keyed by step index; unreadable entries are skipped
    #[serde(default, deserialize_with = "lenient::entries")]
    pub input_changes: BTreeMap<String, ParameterChangeRequest>,
    /// Final state of an earlier run to continue from
    #[serde(default)]
    pub prior_state: Option<PriorStateRequest>,
}

/// Partial override for one step. Same units and leniency as the request.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterChangeRequest {
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub area: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub efficiency: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub cloud_cover: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub specific_heat: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub transmittance: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub absorptance: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub heat_loss_coefficient: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub pump_power: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub hydraulic_head: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub pump_efficiency: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub tank_volume: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub min_ambient_temp: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub max_ambient_temp: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub ambient_temp: Field<f64>,
    /// Sets the fluid temperature directly for this step (°F)
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub fluid_temp: Field<f64>,
    /// Sets the tank temperature directly for this step (°F)
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub tank_temp: Field<f64>,
}

/// Exported state of an earlier run (°F).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriorStateRequest {
    pub fluid_temp: f64,
    pub plate_temp: f64,
    pub tank_temp: f64,
}

// ─── Response ────────────────────────────────────────────────────────────────

/// One simulated step (°F). Non-finite values serialize as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureReading {
    pub time: u32,
    pub fluid_temp: f64,
    pub plate_temp: f64,
    pub tank_temp: f64,
    pub ambient_temp: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    pub temperatures: Vec<TemperatureReading>,
    /// Pass back as `priorState` to continue the run
    pub final_state: PriorStateRequest,
    pub generated_at: DateTime<Utc>,
}
