use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Physical constants ──────────────────────────────────────────────────────

/// Constants the engine needs but never hard-codes.
///
/// Loaded from the `physics` section of `config.json`; tests build their own
/// to vary them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// Working fluid density (kg/m³)
    pub fluid_density: f64,
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Clear-sky irradiance at solar noon (W/m²)
    pub peak_irradiance: f64,
    /// Length of one simulation step (s)
    pub time_step_seconds: f64,
    /// First daylight hour (inclusive)
    pub daylight_start_hour: u32,
    /// Last daylight hour (exclusive)
    pub daylight_end_hour: u32,
    /// Hour of peak irradiance
    pub solar_noon_hour: u32,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            fluid_density: 1000.0,
            gravity: 9.81,
            peak_irradiance: 1000.0,
            time_step_seconds: 3600.0,
            daylight_start_hour: 6,
            daylight_end_hour: 18,
            solar_noon_hour: 12,
        }
    }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Pump characteristics driving the collector loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpSpec {
    /// Electrical pump power (W)
    pub power_w: f64,
    /// Hydraulic head the pump works against (m)
    pub hydraulic_head_m: f64,
    /// Pump efficiency [0..1]
    pub efficiency: f64,
}

/// Collector, pump and tank description used for one step.
///
/// Values are SI/metric and are expected to have passed [`Self::validate`]
/// before reaching the engine. The engine itself never rejects input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Collector aperture area (m²)
    pub area_m2: f64,
    /// Plate efficiency factor F′ [0..1]
    pub plate_efficiency: f64,
    /// Cloud cover fraction [0..1]
    pub cloud_cover: f64,
    /// Fluid specific heat (J/(kg·K))
    pub specific_heat: f64,
    pub transmittance: f64,
    pub absorptance: f64,
    /// Overall heat-loss coefficient U_L (W/(m²·K))
    pub heat_loss_coefficient: f64,
    pub pump: PumpSpec,
    /// Storage tank volume (m³)
    pub tank_volume_m3: f64,
    /// Diurnal minimum ambient temperature (°C)
    pub min_ambient_c: f64,
    /// Diurnal maximum ambient temperature (°C)
    pub max_ambient_c: f64,
    /// When set, used at every hour instead of the diurnal curve (°C)
    pub fixed_ambient_c: Option<f64>,
    /// Hour of day of step 0
    pub start_hour: u32,
}

/// Out-of-domain simulation input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{field} must be strictly positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must lie within [0, 1], got {value}")]
    OutsideUnitInterval { field: &'static str, value: f64 },

    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("start hour must be within 0..=23, got {0}")]
    StartHour(i64),

    #[error("minimum ambient temperature {min_c}°C exceeds maximum {max_c}°C")]
    AmbientRange { min_c: f64, max_c: f64 },

    #[error("start step {start_step} is past the run end {duration}")]
    StepRange { start_step: u32, duration: u32 },

    #[error("{field} of {requested} exceeds the step limit of {limit}")]
    TooManySteps {
        field: &'static str,
        requested: u32,
        limit: u32,
    },
}

fn finite(field: &'static str, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::NotFinite { field, value })
    }
}

pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<(), ParameterError> {
    if finite(field, value)? > 0.0 {
        Ok(())
    } else {
        Err(ParameterError::NotPositive { field, value })
    }
}

pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<(), ParameterError> {
    if finite(field, value)? >= 0.0 {
        Ok(())
    } else {
        Err(ParameterError::Negative { field, value })
    }
}

pub(crate) fn check_unit_interval(field: &'static str, value: f64) -> Result<(), ParameterError> {
    if (0.0..=1.0).contains(&finite(field, value)?) {
        Ok(())
    } else {
        Err(ParameterError::OutsideUnitInterval { field, value })
    }
}

pub(crate) fn check_temperature(field: &'static str, value: f64) -> Result<(), ParameterError> {
    finite(field, value).map(|_| ())
}

impl SimulationParameters {
    /// Checks every field against its physical domain.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_positive("area", self.area_m2)?;
        check_unit_interval("efficiency", self.plate_efficiency)?;
        check_unit_interval("cloudCover", self.cloud_cover)?;
        check_positive("specificHeat", self.specific_heat)?;
        check_unit_interval("transmittance", self.transmittance)?;
        check_unit_interval("absorptance", self.absorptance)?;
        check_positive("heatLossCoefficient", self.heat_loss_coefficient)?;
        check_non_negative("pumpPower", self.pump.power_w)?;
        check_positive("hydraulicHead", self.pump.hydraulic_head_m)?;
        check_unit_interval("pumpEfficiency", self.pump.efficiency)?;
        check_positive("tankVolume", self.tank_volume_m3)?;
        if self.start_hour > 23 {
            return Err(ParameterError::StartHour(i64::from(self.start_hour)));
        }
        if let Some(temp_c) = self.fixed_ambient_c {
            check_temperature("ambientTemp", temp_c)?;
        }
        check_temperature("minAmbientTemp", self.min_ambient_c)?;
        check_temperature("maxAmbientTemp", self.max_ambient_c)?;
        if self.min_ambient_c > self.max_ambient_c {
            return Err(ParameterError::AmbientRange {
                min_c: self.min_ambient_c,
                max_c: self.max_ambient_c,
            });
        }
        Ok(())
    }
}

// ─── Overrides ───────────────────────────────────────────────────────────────

/// Partial patch applied to [`SimulationParameters`] before a given step.
///
/// `None` keeps the value in force. `fluid_temp_c` / `tank_temp_c` overwrite
/// the thermal state directly instead of patching parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterOverride {
    pub area_m2: Option<f64>,
    pub plate_efficiency: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub specific_heat: Option<f64>,
    pub transmittance: Option<f64>,
    pub absorptance: Option<f64>,
    pub heat_loss_coefficient: Option<f64>,
    pub pump_power_w: Option<f64>,
    pub hydraulic_head_m: Option<f64>,
    pub pump_efficiency: Option<f64>,
    pub tank_volume_m3: Option<f64>,
    pub min_ambient_c: Option<f64>,
    pub max_ambient_c: Option<f64>,
    pub fixed_ambient_c: Option<f64>,
    pub fluid_temp_c: Option<f64>,
    pub tank_temp_c: Option<f64>,
}

impl ParameterOverride {
    /// True when the override writes fluid or tank temperature directly.
    pub fn overrides_state(&self) -> bool {
        self.fluid_temp_c.is_some() || self.tank_temp_c.is_some()
    }

    /// Merges the patch into `params`.
    ///
    /// Setting min or max ambient returns the run to the diurnal curve unless
    /// the same patch also sets a fixed ambient.
    pub fn apply_to(&self, params: &mut SimulationParameters) {
        fn set(slot: &mut f64, value: Option<f64>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut params.area_m2, self.area_m2);
        set(&mut params.plate_efficiency, self.plate_efficiency);
        set(&mut params.cloud_cover, self.cloud_cover);
        set(&mut params.specific_heat, self.specific_heat);
        set(&mut params.transmittance, self.transmittance);
        set(&mut params.absorptance, self.absorptance);
        set(&mut params.heat_loss_coefficient, self.heat_loss_coefficient);
        set(&mut params.pump.power_w, self.pump_power_w);
        set(&mut params.pump.hydraulic_head_m, self.hydraulic_head_m);
        set(&mut params.pump.efficiency, self.pump_efficiency);
        set(&mut params.tank_volume_m3, self.tank_volume_m3);

        set(&mut params.min_ambient_c, self.min_ambient_c);
        set(&mut params.max_ambient_c, self.max_ambient_c);

        if self.fixed_ambient_c.is_some() {
            params.fixed_ambient_c = self.fixed_ambient_c;
        } else if self.min_ambient_c.is_some() || self.max_ambient_c.is_some() {
            params.fixed_ambient_c = None;
        }
    }

    /// Checks the fields that are present against the same rules as
    /// [`SimulationParameters::validate`].
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let positive = [
            ("area", self.area_m2),
            ("specificHeat", self.specific_heat),
            ("heatLossCoefficient", self.heat_loss_coefficient),
            ("hydraulicHead", self.hydraulic_head_m),
            ("tankVolume", self.tank_volume_m3),
        ];
        let unit = [
            ("efficiency", self.plate_efficiency),
            ("cloudCover", self.cloud_cover),
            ("transmittance", self.transmittance),
            ("absorptance", self.absorptance),
            ("pumpEfficiency", self.pump_efficiency),
        ];
        let temperatures = [
            ("minAmbientTemp", self.min_ambient_c),
            ("maxAmbientTemp", self.max_ambient_c),
            ("ambientTemp", self.fixed_ambient_c),
            ("fluidTemp", self.fluid_temp_c),
            ("tankTemp", self.tank_temp_c),
        ];

        for (field, value) in positive {
            value.map_or(Ok(()), |v| check_positive(field, v))?;
        }
        for (field, value) in unit {
            value.map_or(Ok(()), |v| check_unit_interval(field, v))?;
        }
        for (field, value) in temperatures {
            value.map_or(Ok(()), |v| check_temperature(field, v))?;
        }
        self.pump_power_w
            .map_or(Ok(()), |v| check_non_negative("pumpPower", v))
    }
}

/// Sparse patch log keyed by step index, applied in step order.
pub type InputChangeSchedule = BTreeMap<u32, ParameterOverride>;

// ─── State ───────────────────────────────────────────────────────────────────

/// Temperatures threaded from one step to the next (°C).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalState {
    pub fluid_temp_c: f64,
    pub plate_temp_c: f64,
    pub tank_temp_c: f64,
}

/// Starting temperatures for a fresh run (°C). The plate starts at the fluid
/// temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartTemperatures {
    pub fluid_temp_c: f64,
    pub tank_temp_c: f64,
}

/// Final state exported by an earlier run, used to resume where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorState {
    pub fluid_temp_c: f64,
    pub plate_temp_c: f64,
    pub tank_temp_c: f64,
}

impl From<StartTemperatures> for ThermalState {
    fn from(start: StartTemperatures) -> Self {
        Self {
            fluid_temp_c: start.fluid_temp_c,
            plate_temp_c: start.fluid_temp_c,
            tank_temp_c: start.tank_temp_c,
        }
    }
}

impl From<PriorState> for ThermalState {
    fn from(prior: PriorState) -> Self {
        Self {
            fluid_temp_c: prior.fluid_temp_c,
            plate_temp_c: prior.plate_temp_c,
            tank_temp_c: prior.tank_temp_c,
        }
    }
}

impl From<ThermalState> for PriorState {
    fn from(state: ThermalState) -> Self {
        Self {
            fluid_temp_c: state.fluid_temp_c,
            plate_temp_c: state.plate_temp_c,
            tank_temp_c: state.tank_temp_c,
        }
    }
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// Collector response for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectorGainResult {
    /// Useful gain q_u (MJ/(m²·step)); negative when the plate loses heat.
    pub useful_gain: f64,
    /// Heat-removal factor F_R
    pub heat_removal_factor: f64,
    /// Collector flow factor F″
    pub flow_factor: f64,
    /// Irradiance absorbed by the plate, S·τ·α (MJ/(m²·step))
    pub absorbed: f64,
    /// Loss to ambient, U_L·ΔT (MJ/(m²·step))
    pub lost: f64,
}

/// Snapshot emitted once per step (°C).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: u32,
    pub fluid_temp_c: f64,
    pub plate_temp_c: f64,
    pub tank_temp_c: f64,
    pub ambient_temp_c: f64,
}

impl StepResult {
    pub fn is_finite(&self) -> bool {
        self.fluid_temp_c.is_finite()
            && self.plate_temp_c.is_finite()
            && self.tank_temp_c.is_finite()
            && self.ambient_temp_c.is_finite()
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub results: Vec<StepResult>,
    /// State after the last step; feed back as [`PriorState`] to resume.
    pub final_state: ThermalState,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Panel and loop used by the reference daily scenario.
    pub fn reference_parameters() -> SimulationParameters {
        SimulationParameters {
            area_m2: 2.0,
            plate_efficiency: 0.8,
            cloud_cover: 0.0,
            specific_heat: 4186.0,
            transmittance: 0.9,
            absorptance: 0.95,
            heat_loss_coefficient: 8.0,
            pump: PumpSpec {
                power_w: 50.0,
                hydraulic_head_m: 5.0,
                efficiency: 0.7,
            },
            tank_volume_m3: 3.0,
            min_ambient_c: 15.0,
            max_ambient_c: 25.0,
            fixed_ambient_c: None,
            start_hour: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::reference_parameters;
    use super::*;

    #[test]
    fn test_reference_parameters_are_valid() {
        assert_eq!(reference_parameters().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_out_of_domain_values() {
        let mut p = reference_parameters();
        p.area_m2 = -1.0;
        assert_eq!(
            p.validate(),
            Err(ParameterError::NotPositive { field: "area", value: -1.0 })
        );

        let mut p = reference_parameters();
        p.pump.efficiency = 1.5;
        assert!(matches!(
            p.validate(),
            Err(ParameterError::OutsideUnitInterval { field: "pumpEfficiency", .. })
        ));

        let mut p = reference_parameters();
        p.start_hour = 24;
        assert_eq!(p.validate(), Err(ParameterError::StartHour(24)));

        let mut p = reference_parameters();
        p.min_ambient_c = 30.0;
        p.max_ambient_c = 10.0;
        assert!(matches!(p.validate(), Err(ParameterError::AmbientRange { .. })));

        let mut p = reference_parameters();
        p.heat_loss_coefficient = f64::NAN;
        assert!(matches!(p.validate(), Err(ParameterError::NotFinite { .. })));
    }

    #[test]
    fn test_zero_pump_power_is_valid() {
        let mut p = reference_parameters();
        p.pump.power_w = 0.0;
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn test_override_keeps_unspecified_fields() {
        let mut p = reference_parameters();
        let patch = ParameterOverride {
            cloud_cover: Some(0.5),
            pump_power_w: Some(0.0),
            ..Default::default()
        };
        patch.apply_to(&mut p);

        let mut expected = reference_parameters();
        expected.cloud_cover = 0.5;
        expected.pump.power_w = 0.0;
        assert_eq!(p, expected);
    }

    #[test]
    fn test_override_switches_ambient_profile() {
        let mut p = reference_parameters();

        ParameterOverride {
            fixed_ambient_c: Some(5.0),
            ..Default::default()
        }
        .apply_to(&mut p);
        assert_eq!(p.fixed_ambient_c, Some(5.0));

        ParameterOverride {
            max_ambient_c: Some(30.0),
            ..Default::default()
        }
        .apply_to(&mut p);
        assert_eq!(p.fixed_ambient_c, None);
        assert_eq!((p.min_ambient_c, p.max_ambient_c), (15.0, 30.0));
    }

    #[test]
    fn test_override_validation_only_checks_present_fields() {
        assert_eq!(ParameterOverride::default().validate(), Ok(()));

        let bad = ParameterOverride {
            tank_volume_m3: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ParameterError::NotPositive { field: "tankVolume", .. })
        ));
    }
}
