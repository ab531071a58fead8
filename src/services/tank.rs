use crate::models::simulation::{PhysicalConstants, PumpSpec};
use crate::services::mass_flow::mass_flow_rate;

/// Storage tank seen as one well-mixed thermal mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankExchange {
    pub fluid_temp_c: f64,
    pub tank_temp_c: f64,
    pub tank_volume_m3: f64,
    pub specific_heat: f64,
}

/// Tank temperature after one step of exchange with the collector loop (°C).
///
/// ```text
/// Q  = ṁ · c_p · (T_fluid − T_tank)      [W]
/// C  = V · ρ · c_p                        [J/K]
/// ΔT = Q · Δt / C
/// ```
///
/// Heat flows either way: a tank warmer than the loop fluid cools down. The
/// result is not clamped to any physical range.
pub fn exchange_heat(exchange: &TankExchange, pump: &PumpSpec, constants: &PhysicalConstants) -> f64 {
    let flow_kg_s = mass_flow_rate(pump, constants);
    let heat_rate_w =
        flow_kg_s * exchange.specific_heat * (exchange.fluid_temp_c - exchange.tank_temp_c);
    let capacity_j_k = exchange.tank_volume_m3 * constants.fluid_density * exchange.specific_heat;

    exchange.tank_temp_c + heat_rate_w * constants.time_step_seconds / capacity_j_k
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pump(power_w: f64) -> PumpSpec {
        PumpSpec {
            power_w,
            hydraulic_head_m: 5.0,
            efficiency: 0.7,
        }
    }

    fn tank(fluid_temp_c: f64, tank_temp_c: f64) -> TankExchange {
        TankExchange {
            fluid_temp_c,
            tank_temp_c,
            tank_volume_m3: 0.2,
            specific_heat: 4186.0,
        }
    }

    #[test]
    fn test_warm_fluid_heats_tank() {
        let c = PhysicalConstants::default();
        // Weak pump so one step does not overshoot the loop temperature.
        let p = pump(0.5);
        let next = exchange_heat(&tank(30.0, 20.0), &p, &c);

        let flow = mass_flow_rate(&p, &c);
        let expected = 20.0 + flow * 10.0 * 3600.0 / (0.2 * 1000.0);
        assert_relative_eq!(next, expected, epsilon = 1e-9);
        assert!(next > 20.0 && next < 30.0);
    }

    #[test]
    fn test_cool_fluid_draws_heat_from_tank() {
        let next = exchange_heat(&tank(15.0, 40.0), &pump(0.5), &PhysicalConstants::default());
        assert!(next < 40.0);
    }

    #[test]
    fn test_no_flow_leaves_tank_untouched() {
        let next = exchange_heat(&tank(80.0, 22.25), &pump(0.0), &PhysicalConstants::default());
        assert_eq!(next, 22.25);
    }

    #[test]
    fn test_equal_temperatures_exchange_nothing() {
        let next = exchange_heat(&tank(35.0, 35.0), &pump(50.0), &PhysicalConstants::default());
        assert_eq!(next, 35.0);
    }

    #[test]
    fn test_large_steps_are_not_clamped() {
        // Reference pump over an hour moves ~12x the tank mass: explicit Euler overshoots.
        let next = exchange_heat(&tank(30.0, 20.0), &pump(50.0), &PhysicalConstants::default());
        assert!(next > 30.0);
    }
}
