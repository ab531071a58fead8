/// ============================================================
///  Hourly collector + storage tank simulation
///
///  Per step s in [start_step, duration):
///   1. Scheduled override   – patch parameters, or write temperatures
///                             directly and skip the physics for this step
///   2. Hour of day          – (start_hour + s) mod 24
///   3. Ambient temperature  – fixed, or diurnal sinusoid min..max
///   4. Collector gain       – Hottel-Whillier-Bliss with current plate temp
///   5. Fluid / plate update
///   6. Tank exchange        – using the new fluid temperature
///   7. Emit StepResult
///
///  Explicit Euler, one node per body. Nothing is validated or recovered
///  here: non-finite values flow into the results unchanged.
/// ============================================================

use std::f64::consts::PI;

use tracing::debug;
#[cfg(feature = "verbose_log")]
use tracing::trace;

use crate::models::simulation::{
    CollectorGainResult, InputChangeSchedule, PhysicalConstants, PriorState, SimulationOutcome,
    SimulationParameters, StartTemperatures, StepResult, ThermalState,
};
use crate::services::collector::{collector_gain, CollectorConditions};
use crate::services::fluid::advance_fluid;
use crate::services::mass_flow::mass_flow_rate;
use crate::services::tank::{exchange_heat, TankExchange};

/// Immutable engine; every call to [`SimulationEngine::simulate`] owns its
/// own state, so one engine can serve concurrent runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationEngine {
    constants: PhysicalConstants,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(PhysicalConstants::default())
    }
}

impl SimulationEngine {
    pub fn new(constants: PhysicalConstants) -> Self {
        Self { constants }
    }

    /// Ambient temperature at `hour` (°C).
    ///
    /// Without a fixed override: `mid + amp · sin((hour − 6)·π/12)`, lowest at
    /// 00:00, crossing the midpoint at 06:00 and peaking at 12:00.
    pub fn ambient_temperature(&self, params: &SimulationParameters, hour: u32) -> f64 {
        if let Some(fixed) = params.fixed_ambient_c {
            return fixed;
        }
        let mid = (params.max_ambient_c + params.min_ambient_c) / 2.0;
        let amplitude = (params.max_ambient_c - params.min_ambient_c) / 2.0;
        mid + amplitude * ((f64::from(hour) - 6.0) * PI / 12.0).sin()
    }

    /// Runs steps `start_step..duration` and returns one [`StepResult`] per
    /// step, in order, plus the final state.
    ///
    /// The run starts from `prior` when given, otherwise from `start` (plate at
    /// the fluid temperature). Schedule entries are applied on the step they
    /// are keyed by. Parameter patches keyed before `start_step` are folded
    /// in up front so a resumed run sees the parameters in force at that
    /// step; their fluid/tank temperatures are not, since `prior` already
    /// carries the state.
    pub fn simulate(
        &self,
        initial: &SimulationParameters,
        schedule: &InputChangeSchedule,
        start: StartTemperatures,
        prior: Option<PriorState>,
        start_step: u32,
        duration: u32,
    ) -> SimulationOutcome {
        let mut params = initial.clone();
        for patch in schedule.range(..start_step).map(|(_, p)| p) {
            patch.apply_to(&mut params);
        }
        let mut state: ThermalState = prior.map_or_else(|| start.into(), Into::into);

        debug!(
            start_step,
            duration,
            resumed = prior.is_some(),
            overrides = schedule.len(),
            "starting simulation run"
        );

        let mut results = Vec::with_capacity(duration.saturating_sub(start_step) as usize);
        // MJ/m² over the run, for the summary log
        let (mut absorbed, mut lost, mut useful) = (0.0_f64, 0.0_f64, 0.0_f64);

        for step in start_step..duration {
            let patch = schedule.get(&step);
            if let Some(patch) = patch {
                patch.apply_to(&mut params);
            }

            let hour = (params.start_hour + step) % 24;
            let ambient_temp_c = self.ambient_temperature(&params, hour);

            match patch.filter(|p| p.overrides_state()) {
                Some(patch) => {
                    if let Some(fluid) = patch.fluid_temp_c {
                        state.fluid_temp_c = fluid;
                    }
                    if let Some(tank) = patch.tank_temp_c {
                        state.tank_temp_c = tank;
                    }
                }
                None => {
                    let (next, gain) = self.step(&params, state, hour, ambient_temp_c);
                    absorbed += gain.absorbed;
                    lost += gain.lost;
                    useful += gain.useful_gain;
                    state = next;
                }
            }

            let result = StepResult {
                step,
                fluid_temp_c: state.fluid_temp_c,
                plate_temp_c: state.plate_temp_c,
                tank_temp_c: state.tank_temp_c,
                ambient_temp_c,
            };

            #[cfg(feature = "verbose_log")]
            trace!(
                step,
                hour,
                fluid = result.fluid_temp_c,
                plate = result.plate_temp_c,
                tank = result.tank_temp_c,
                ambient = result.ambient_temp_c,
                "step"
            );

            results.push(result);
        }

        debug!(
            steps = results.len(),
            absorbed_mj_m2 = absorbed,
            lost_mj_m2 = lost,
            useful_mj_m2 = useful,
            fluid = state.fluid_temp_c,
            tank = state.tank_temp_c,
            "simulation run finished"
        );

        SimulationOutcome {
            results,
            final_state: state,
        }
    }

    /// One physical step: collector → fluid/plate → tank.
    fn step(
        &self,
        params: &SimulationParameters,
        state: ThermalState,
        hour: u32,
        ambient_temp_c: f64,
    ) -> (ThermalState, CollectorGainResult) {
        let c = &self.constants;

        let conditions = CollectorConditions {
            hour,
            area_m2: params.area_m2,
            plate_efficiency: params.plate_efficiency,
            cloud_cover: params.cloud_cover,
            specific_heat: params.specific_heat,
            ambient_temp_c,
            plate_temp_c: state.plate_temp_c,
            transmittance: params.transmittance,
            absorptance: params.absorptance,
            heat_loss_coefficient: params.heat_loss_coefficient,
        };
        let gain = collector_gain(&conditions, mass_flow_rate(&params.pump, c), c);

        let fluid = advance_fluid(
            &gain,
            state.fluid_temp_c,
            state.plate_temp_c,
            params.heat_loss_coefficient,
            c.time_step_seconds,
        );

        let tank_temp_c = exchange_heat(
            &TankExchange {
                fluid_temp_c: fluid.fluid_temp_c,
                tank_temp_c: state.tank_temp_c,
                tank_volume_m3: params.tank_volume_m3,
                specific_heat: params.specific_heat,
            },
            &params.pump,
            c,
        );

        let next = ThermalState {
            fluid_temp_c: fluid.fluid_temp_c,
            plate_temp_c: fluid.plate_temp_c,
            tank_temp_c,
        };
        (next, gain)
    }
}
