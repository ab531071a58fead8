use crate::models::simulation::CollectorGainResult;
use crate::services::irradiance::J_TO_MJ;

/// Fluid and plate temperatures after one step (°C).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidUpdate {
    pub fluid_temp_c: f64,
    pub plate_temp_c: f64,
}

/// Advances the collector's fluid and plate temperatures by one step.
///
/// With no flow (`F_R == 0`) the fluid holds its temperature and the plate
/// moves by `q_u / U_L`. Otherwise the useful gain is converted to watts and
/// both temperatures are placed relative to the current mean fluid
/// temperature:
///
/// ```text
/// T_f' = T_f + q / (F_R·U_L) · (1 − F″)
/// T_p' = T_f + q / (F_R·U_L) · (1 − F_R)
/// ```
///
/// As `F_R → 0⁺` with a nonzero gain the increment blows up; the result is
/// returned as is, including non-finite values.
pub fn advance_fluid(
    gain: &CollectorGainResult,
    fluid_temp_c: f64,
    plate_temp_c: f64,
    heat_loss_coefficient: f64,
    time_step_seconds: f64,
) -> FluidUpdate {
    if gain.heat_removal_factor == 0.0 {
        return FluidUpdate {
            fluid_temp_c,
            plate_temp_c: plate_temp_c + gain.useful_gain / heat_loss_coefficient,
        };
    }

    // MJ/(m²·step) → W/m²
    let gain_w_m2 = gain.useful_gain / (J_TO_MJ * time_step_seconds);
    let rise = gain_w_m2 / (gain.heat_removal_factor * heat_loss_coefficient);

    FluidUpdate {
        fluid_temp_c: fluid_temp_c + rise * (1.0 - gain.flow_factor),
        plate_temp_c: fluid_temp_c + rise * (1.0 - gain.heat_removal_factor),
    }
}
