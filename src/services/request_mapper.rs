use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::RequestDefaults;
use crate::models::lenient::Field;
use crate::models::request::{
    ParameterChangeRequest, PriorStateRequest, SimulationRequest, SimulationResponse,
    TemperatureReading,
};
use crate::models::simulation::{
    check_temperature, InputChangeSchedule, ParameterError, ParameterOverride, PriorState,
    PumpSpec, SimulationOutcome, SimulationParameters, StartTemperatures, StepResult,
};
use crate::services::units::{celsius_to_fahrenheit, fahrenheit_to_celsius};

/// Validated, metric engine inputs built from a request.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineInputs {
    pub parameters: SimulationParameters,
    pub schedule: InputChangeSchedule,
    pub start: StartTemperatures,
    pub prior: Option<PriorState>,
    pub start_step: u32,
    pub duration: u32,
}

fn or_default(field: Field<f64>, name: &str, default: f64) -> f64 {
    if field.is_malformed() {
        warn!(field = name, default, "malformed request field, using default");
    }
    field.value().unwrap_or(default)
}

fn optional(field: Field<f64>, name: &str, step: u32) -> Option<f64> {
    if field.is_malformed() {
        warn!(field = name, step, "malformed override field, ignoring");
    }
    field.value()
}

fn step_index(
    field: Field<i64>,
    name: &'static str,
    default: u32,
    limit: u32,
) -> Result<u32, ParameterError> {
    if field.is_malformed() {
        warn!(field = name, default, "malformed request field, using default");
    }
    let Some(value) = field.value() else {
        return Ok(default);
    };
    if value < 0 {
        return Err(ParameterError::Negative {
            field: name,
            value: value as f64,
        });
    }
    match u32::try_from(value) {
        Ok(v) if v <= limit => Ok(v),
        _ => Err(ParameterError::TooManySteps {
            field: name,
            requested: u32::try_from(value).unwrap_or(u32::MAX),
            limit,
        }),
    }
}

fn to_override(change: &ParameterChangeRequest, step: u32) -> ParameterOverride {
    let temp = |field: Field<f64>, name: &str| optional(field, name, step).map(fahrenheit_to_celsius);

    ParameterOverride {
        area_m2: optional(change.area, "area", step),
        plate_efficiency: optional(change.efficiency, "efficiency", step),
        cloud_cover: optional(change.cloud_cover, "cloudCover", step),
        specific_heat: optional(change.specific_heat, "specificHeat", step),
        transmittance: optional(change.transmittance, "transmittance", step),
        absorptance: optional(change.absorptance, "absorptance", step),
        heat_loss_coefficient: optional(change.heat_loss_coefficient, "heatLossCoefficient", step),
        pump_power_w: optional(change.pump_power, "pumpPower", step),
        hydraulic_head_m: optional(change.hydraulic_head, "hydraulicHead", step),
        pump_efficiency: optional(change.pump_efficiency, "pumpEfficiency", step),
        tank_volume_m3: optional(change.tank_volume, "tankVolume", step),
        min_ambient_c: temp(change.min_ambient_temp, "minAmbientTemp"),
        max_ambient_c: temp(change.max_ambient_temp, "maxAmbientTemp"),
        fixed_ambient_c: temp(change.ambient_temp, "ambientTemp"),
        fluid_temp_c: temp(change.fluid_temp, "fluidTemp"),
        tank_temp_c: temp(change.tank_temp, "tankTemp"),
    }
}

fn to_prior(prior: &PriorStateRequest) -> Result<PriorState, ParameterError> {
    check_temperature("priorState.fluidTemp", prior.fluid_temp)?;
    check_temperature("priorState.plateTemp", prior.plate_temp)?;
    check_temperature("priorState.tankTemp", prior.tank_temp)?;
    Ok(PriorState {
        fluid_temp_c: fahrenheit_to_celsius(prior.fluid_temp),
        plate_temp_c: fahrenheit_to_celsius(prior.plate_temp),
        tank_temp_c: fahrenheit_to_celsius(prior.tank_temp),
    })
}

/// Builds engine inputs from a request.
///
/// Absent or unreadable fields fall back to `defaults`; values that are
/// readable but physically meaningless are rejected. Every override in the
/// schedule is checked on its own and again after merging into the
/// parameters in force at its step.
pub fn to_engine_inputs(
    request: &SimulationRequest,
    defaults: &RequestDefaults,
    max_steps: u32,
) -> Result<EngineInputs, ParameterError> {
    let r = request;
    let d = defaults;

    let start_hour = match r.start_hour.value() {
        Some(h) if !(0..=23).contains(&h) => return Err(ParameterError::StartHour(h)),
        Some(h) => h as u32,
        None => {
            if r.start_hour.is_malformed() {
                warn!(field = "startHour", default = d.start_hour, "malformed request field, using default");
            }
            d.start_hour
        }
    };

    let duration = step_index(r.duration, "duration", d.duration, max_steps)?;
    let start_step = step_index(r.start_step, "startStep", 0, max_steps)?;
    if start_step > duration {
        return Err(ParameterError::StepRange { start_step, duration });
    }

    let fixed_ambient_c = r
        .ambient_temp
        .value()
        .map(fahrenheit_to_celsius);
    if r.ambient_temp.is_malformed() {
        warn!(field = "ambientTemp", "malformed request field, using diurnal profile");
    }

    let parameters = SimulationParameters {
        area_m2: or_default(r.area, "area", d.area),
        plate_efficiency: or_default(r.efficiency, "efficiency", d.efficiency),
        cloud_cover: or_default(r.cloud_cover, "cloudCover", d.cloud_cover),
        specific_heat: or_default(r.specific_heat, "specificHeat", d.specific_heat),
        transmittance: or_default(r.transmittance, "transmittance", d.transmittance),
        absorptance: or_default(r.absorptance, "absorptance", d.absorptance),
        heat_loss_coefficient: or_default(
            r.heat_loss_coefficient,
            "heatLossCoefficient",
            d.heat_loss_coefficient,
        ),
        pump: PumpSpec {
            power_w: or_default(r.pump_power, "pumpPower", d.pump_power),
            hydraulic_head_m: or_default(r.hydraulic_head, "hydraulicHead", d.hydraulic_head),
            efficiency: or_default(r.pump_efficiency, "pumpEfficiency", d.pump_efficiency),
        },
        tank_volume_m3: or_default(r.tank_volume, "tankVolume", d.tank_volume),
        min_ambient_c: fahrenheit_to_celsius(or_default(
            r.min_ambient_temp,
            "minAmbientTemp",
            d.min_ambient_temp,
        )),
        max_ambient_c: fahrenheit_to_celsius(or_default(
            r.max_ambient_temp,
            "maxAmbientTemp",
            d.max_ambient_temp,
        )),
        fixed_ambient_c,
        start_hour,
    };
    parameters.validate()?;

    let start = StartTemperatures {
        fluid_temp_c: fahrenheit_to_celsius(or_default(
            r.initial_fluid_temp,
            "initialFluidTemp",
            d.initial_fluid_temp,
        )),
        tank_temp_c: fahrenheit_to_celsius(or_default(
            r.initial_tank_temp,
            "initialTankTemp",
            d.initial_tank_temp,
        )),
    };

    let mut schedule = InputChangeSchedule::new();
    for (key, change) in &r.input_changes {
        match key.trim().parse::<u32>() {
            Ok(step) => {
                let patch = to_override(change, step);
                patch.validate()?;
                schedule.insert(step, patch);
            }
            Err(_) => warn!(key = %key, "input change key is not a step index, ignoring"),
        }
    }

    let mut merged = parameters.clone();
    for patch in schedule.values() {
        patch.apply_to(&mut merged);
        merged.validate()?;
    }

    let prior = r.prior_state.as_ref().map(to_prior).transpose()?;

    Ok(EngineInputs {
        parameters,
        schedule,
        start,
        prior,
        start_step,
        duration,
    })
}

fn to_reading(step: &StepResult) -> TemperatureReading {
    TemperatureReading {
        time: step.step,
        fluid_temp: celsius_to_fahrenheit(step.fluid_temp_c),
        plate_temp: celsius_to_fahrenheit(step.plate_temp_c),
        tank_temp: celsius_to_fahrenheit(step.tank_temp_c),
        ambient_temp: celsius_to_fahrenheit(step.ambient_temp_c),
    }
}

/// Converts engine output back to °F for the response body.
pub fn to_response(outcome: &SimulationOutcome, generated_at: DateTime<Utc>) -> SimulationResponse {
    let state = outcome.final_state;
    SimulationResponse {
        temperatures: outcome.results.iter().map(to_reading).collect(),
        final_state: PriorStateRequest {
            fluid_temp: celsius_to_fahrenheit(state.fluid_temp_c),
            plate_temp: celsius_to_fahrenheit(state.plate_temp_c),
            tank_temp: celsius_to_fahrenheit(state.tank_temp_c),
        },
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn request(json: &str) -> SimulationRequest {
        serde_json::from_str(json).unwrap()
    }

    fn map(json: &str) -> Result<EngineInputs, ParameterError> {
        to_engine_inputs(&request(json), &RequestDefaults::default(), 8760)
    }

    #[test]
    fn test_empty_body_takes_every_default() {
        let inputs = map("{}").unwrap();
        let p = &inputs.parameters;
        assert_eq!(p.area_m2, 2.0);
        assert_eq!(p.plate_efficiency, 0.15);
        assert_eq!(p.pump.power_w, 50.0);
        assert_eq!(p.tank_volume_m3, 3.0);
        assert_relative_eq!(p.min_ambient_c, 15.0, epsilon = 1e-12);
        assert_relative_eq!(p.max_ambient_c, 25.0, epsilon = 1e-12);
        assert_eq!(p.fixed_ambient_c, None);
        assert_relative_eq!(inputs.start.fluid_temp_c, 20.0, epsilon = 1e-12);
        assert_eq!((inputs.start_step, inputs.duration), (0, 24));
        assert!(inputs.schedule.is_empty());
        assert!(inputs.prior.is_none());
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let inputs = map(r#"{"area": "3.5", "pumpPower": "0", "duration": "48"}"#).unwrap();
        assert_eq!(inputs.parameters.area_m2, 3.5);
        assert_eq!(inputs.parameters.pump.power_w, 0.0);
        assert_eq!(inputs.duration, 48);
    }

    #[test]
    fn test_malformed_fields_fall_back_to_defaults() {
        let inputs = map(r#"{"area": "big", "efficiency": true, "startHour": "noon"}"#).unwrap();
        assert_eq!(inputs.parameters.area_m2, 2.0);
        assert_eq!(inputs.parameters.plate_efficiency, 0.15);
        assert_eq!(inputs.parameters.start_hour, 0);
    }

    #[test]
    fn test_out_of_domain_fields_are_rejected() {
        assert!(matches!(
            map(r#"{"area": -2}"#),
            Err(ParameterError::NotPositive { field: "area", .. })
        ));
        assert!(matches!(
            map(r#"{"pumpEfficiency": 1.2}"#),
            Err(ParameterError::OutsideUnitInterval { field: "pumpEfficiency", .. })
        ));
        assert_eq!(map(r#"{"startHour": 24}"#), Err(ParameterError::StartHour(24)));
        assert!(matches!(
            map(r#"{"duration": 9000}"#),
            Err(ParameterError::TooManySteps { field: "duration", requested: 9000, limit: 8760 })
        ));
        let err = map(r#"{"startStep": 9000, "duration": 24}"#).unwrap_err();
        assert_eq!(
            err,
            ParameterError::TooManySteps { field: "startStep", requested: 9000, limit: 8760 }
        );
        assert!(err.to_string().starts_with("startStep"), "{err}");
        assert!(matches!(
            map(r#"{"startStep": 30, "duration": 24}"#),
            Err(ParameterError::StepRange { .. })
        ));
    }

    #[test]
    fn test_fixed_ambient_is_converted() {
        let inputs = map(r#"{"ambientTemp": 50}"#).unwrap();
        assert_relative_eq!(inputs.parameters.fixed_ambient_c.unwrap(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_input_changes_become_schedule() {
        let inputs = map(
            r#"{"inputChanges": {
                "5": {"fluidTemp": 140},
                "10": {"cloudCover": "0.5", "pumpPower": "off"},
                "soon": {"area": 9}
            }}"#,
        )
        .unwrap();

        assert_eq!(inputs.schedule.len(), 2);
        assert_relative_eq!(inputs.schedule[&5].fluid_temp_c.unwrap(), 60.0, epsilon = 1e-12);
        assert_eq!(inputs.schedule[&10].cloud_cover, Some(0.5));
        assert_eq!(inputs.schedule[&10].pump_power_w, None);
    }

    #[test]
    fn test_merged_override_is_validated() {
        // Raising the minimum above the maximum only shows up after merging.
        assert!(matches!(
            map(r#"{"inputChanges": {"3": {"minAmbientTemp": 90}}}"#),
            Err(ParameterError::AmbientRange { .. })
        ));
        assert!(matches!(
            map(r#"{"inputChanges": {"3": {"cloudCover": 2}}}"#),
            Err(ParameterError::OutsideUnitInterval { field: "cloudCover", .. })
        ));
    }

    #[test]
    fn test_prior_state_is_converted() {
        let inputs = map(
            r#"{"priorState": {"fluidTemp": 104, "plateTemp": 122, "tankTemp": 86}, "startStep": 12}"#,
        )
        .unwrap();
        let prior = inputs.prior.unwrap();
        assert_relative_eq!(prior.fluid_temp_c, 40.0, epsilon = 1e-12);
        assert_relative_eq!(prior.plate_temp_c, 50.0, epsilon = 1e-12);
        assert_relative_eq!(prior.tank_temp_c, 30.0, epsilon = 1e-12);
        assert_eq!(inputs.start_step, 12);
    }

    #[test]
    fn test_response_is_fahrenheit() {
        let outcome = SimulationOutcome {
            results: vec![StepResult {
                step: 3,
                fluid_temp_c: 100.0,
                plate_temp_c: 0.0,
                tank_temp_c: -40.0,
                ambient_temp_c: f64::NAN,
            }],
            final_state: crate::models::simulation::ThermalState {
                fluid_temp_c: 100.0,
                plate_temp_c: 0.0,
                tank_temp_c: -40.0,
            },
        };
        let response = to_response(&outcome, Utc::now());
        let reading = response.temperatures[0];
        assert_eq!(reading.time, 3);
        assert_relative_eq!(reading.fluid_temp, 212.0, epsilon = 1e-12);
        assert_relative_eq!(reading.plate_temp, 32.0, epsilon = 1e-12);
        assert_relative_eq!(reading.tank_temp, -40.0, epsilon = 1e-12);
        assert!(reading.ambient_temp.is_nan());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["temperatures"][0]["ambientTemp"].is_null());
        assert_eq!(json["finalState"]["plateTemp"], 32.0);
    }
}
