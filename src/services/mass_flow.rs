use crate::models::simulation::{PhysicalConstants, PumpSpec};

/// Mass flow rate delivered by the loop pump (kg/s).
///
/// Hydraulic power `P·η` lifts `Q` m³/s against head `H`:
/// `Q = P·η / (H·g·ρ)`, then `ṁ = Q·ρ`.
///
/// Shared by the collector and the tank so both always see the same flow.
pub fn mass_flow_rate(pump: &PumpSpec, constants: &PhysicalConstants) -> f64 {
    let hydraulic_power_w = pump.power_w * pump.efficiency;
    let volumetric_m3_s =
        hydraulic_power_w / (pump.hydraulic_head_m * constants.gravity * constants.fluid_density);
    volumetric_m3_s * constants.fluid_density
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_pump() {
        let pump = PumpSpec {
            power_w: 50.0,
            hydraulic_head_m: 5.0,
            efficiency: 0.7,
        };
        // 35 W / (5 m · 9.81 m/s²) ≈ 0.7136 kg/s
        assert_relative_eq!(
            mass_flow_rate(&pump, &PhysicalConstants::default()),
            35.0 / 49.05,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_no_power_no_flow() {
        let pump = PumpSpec {
            power_w: 0.0,
            hydraulic_head_m: 5.0,
            efficiency: 0.7,
        };
        assert_eq!(mass_flow_rate(&pump, &PhysicalConstants::default()), 0.0);
    }

    #[test]
    fn test_mass_flow_does_not_depend_on_density() {
        // ρ cancels: ṁ = P·η / (H·g)
        let pump = PumpSpec {
            power_w: 80.0,
            hydraulic_head_m: 4.0,
            efficiency: 0.5,
        };
        let water = PhysicalConstants::default();
        let glycol = PhysicalConstants {
            fluid_density: 1040.0,
            ..water
        };
        assert_relative_eq!(
            mass_flow_rate(&pump, &water),
            mass_flow_rate(&pump, &glycol),
            epsilon = 1e-12
        );
    }
}
