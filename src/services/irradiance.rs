//! Usable solar energy density reaching the collector, per step.
//!
//! The sun is modelled as a squared-cosine bump over a fixed daylight window
//! centred on solar noon. No geography, no season, no diffuse/direct split.

use std::f64::consts::PI;

use crate::models::simulation::PhysicalConstants;

/// Joules → megajoules
pub const J_TO_MJ: f64 = 1e-6;

/// Irradiance for one step (MJ/(m²·step)).
///
/// * `hour` – hour of day, 0..=23
/// * `cloud_cover` – fraction of the sky covered, 0..=1
///
/// Exactly `0.0` outside `[daylight_start_hour, daylight_end_hour)`.
pub fn irradiance(hour: u32, cloud_cover: f64, constants: &PhysicalConstants) -> f64 {
    if hour < constants.daylight_start_hour || hour >= constants.daylight_end_hour {
        return 0.0;
    }

    let half_day = f64::from(constants.daylight_end_hour - constants.daylight_start_hour) / 2.0;
    let from_noon = f64::from(hour) - f64::from(constants.solar_noon_hour);
    let shape = (from_noon * PI / (2.0 * half_day)).cos().powi(2);

    // W/m² → J/m² over the step → MJ/m²
    let power_w_m2 = constants.peak_irradiance * shape * (1.0 - cloud_cover);
    power_w_m2 * constants.time_step_seconds * J_TO_MJ
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hourly() -> PhysicalConstants {
        PhysicalConstants::default()
    }

    #[test]
    fn test_dark_hours_are_exactly_zero() {
        let c = hourly();
        for hour in (0..6).chain(18..24) {
            for cloud in [0.0, 0.3, 1.0] {
                assert_eq!(irradiance(hour, cloud, &c), 0.0, "hour {hour} cloud {cloud}");
            }
        }
    }

    #[test]
    fn test_noon_peak_value() {
        // 1000 W/m² for an hour = 3.6 MJ/m²
        assert_relative_eq!(irradiance(12, 0.0, &hourly()), 3.6, epsilon = 1e-12);
    }

    #[test]
    fn test_noon_is_daily_maximum() {
        let c = hourly();
        let noon = irradiance(12, 0.0, &c);
        for hour in 0..24 {
            assert!(irradiance(hour, 0.0, &c) <= noon, "hour {hour} beats noon");
        }
    }

    #[test]
    fn test_curve_is_symmetric_around_noon() {
        let c = hourly();
        for offset in 1..6 {
            assert_relative_eq!(
                irradiance(12 - offset, 0.0, &c),
                irradiance(12 + offset, 0.0, &c),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_more_cloud_never_increases_irradiance() {
        let c = hourly();
        let covers = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for hour in 6..18 {
            for pair in covers.windows(2) {
                assert!(
                    irradiance(hour, pair[0], &c) >= irradiance(hour, pair[1], &c),
                    "hour {hour}: cover {} < {}",
                    pair[0],
                    pair[1]
                );
            }
        }
        assert_eq!(irradiance(12, 1.0, &c), 0.0);
    }

    #[test]
    fn test_half_hour_step_halves_energy() {
        let c = PhysicalConstants {
            time_step_seconds: 1800.0,
            ..hourly()
        };
        assert_relative_eq!(irradiance(12, 0.0, &c), 1.8, epsilon = 1e-12);
    }
}
