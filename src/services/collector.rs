/// ============================================================
///  Flat-plate collector energy gain (Hottel-Whillier-Bliss)
///
///   capacitance rate  cr  = ṁ·c_p / (A·U_L·F′)
///   flow factor       F″  = cr · (1 − e^(−1/cr))
///   heat removal      F_R = F″ · F′
///   useful gain       q_u = F_R · [S·τ·α − U_L·(T_p − T_a)·Δt]
///
///  All energies are MJ/(m²·step). The irradiance term arrives already
///  converted; the loss term is converted here with the same step length.
/// ============================================================

use crate::models::simulation::{CollectorGainResult, PhysicalConstants};
use crate::services::irradiance::{irradiance, J_TO_MJ};

/// Collector state and geometry for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectorConditions {
    pub hour: u32,
    pub area_m2: f64,
    /// F′
    pub plate_efficiency: f64,
    pub cloud_cover: f64,
    pub specific_heat: f64,
    pub ambient_temp_c: f64,
    pub plate_temp_c: f64,
    pub transmittance: f64,
    pub absorptance: f64,
    /// U_L (W/(m²·K))
    pub heat_loss_coefficient: f64,
}

/// Heat-removal factors and useful gain for the given mass flow (kg/s).
///
/// A non-positive mass flow takes the no-flow branch: `F_R = F″ = 0` and so
/// `q_u = 0`. A negative `q_u` means the plate is losing heat, which is a
/// valid state.
pub fn collector_gain(
    conditions: &CollectorConditions,
    mass_flow_rate: f64,
    constants: &PhysicalConstants,
) -> CollectorGainResult {
    let c = conditions;

    let (flow_factor, heat_removal_factor) = if mass_flow_rate <= 0.0 {
        (0.0, 0.0)
    } else {
        let capacitance_rate = (mass_flow_rate * c.specific_heat)
            / (c.area_m2 * c.heat_loss_coefficient * c.plate_efficiency);
        let f_double_prime = capacitance_rate * (1.0 - (-1.0 / capacitance_rate).exp());
        (f_double_prime, f_double_prime * c.plate_efficiency)
    };

    let absorbed = irradiance(c.hour, c.cloud_cover, constants) * c.transmittance * c.absorptance;
    let lost = c.heat_loss_coefficient
        * (c.plate_temp_c - c.ambient_temp_c)
        * constants.time_step_seconds
        * J_TO_MJ;

    CollectorGainResult {
        useful_gain: heat_removal_factor * (absorbed - lost),
        heat_removal_factor,
        flow_factor,
        absorbed,
        lost,
    }
}
