use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::simulation::PhysicalConstants;

fn default_port() -> u16 { 8080 }
fn default_max_steps() -> u32 { 8760 }

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid physics section: {0}")]
    Physics(String),
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub physics: PhysicalConstants,
    #[serde(default)]
    pub defaults: RequestDefaults,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on `duration` accepted from a request.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Allowed CORS origins; empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_steps: default_max_steps(),
            cors_origins: Vec::new(),
        }
    }
}

/// Values used for request fields that are absent or malformed.
/// Temperatures are °F, like the request itself.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestDefaults {
    pub area: f64,
    pub efficiency: f64,
    pub cloud_cover: f64,
    pub specific_heat: f64,
    pub transmittance: f64,
    pub absorptance: f64,
    pub heat_loss_coefficient: f64,
    pub pump_power: f64,
    pub hydraulic_head: f64,
    pub pump_efficiency: f64,
    pub tank_volume: f64,
    pub min_ambient_temp: f64,
    pub max_ambient_temp: f64,
    pub initial_fluid_temp: f64,
    pub initial_tank_temp: f64,
    pub start_hour: u32,
    pub duration: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            area: 2.0,
            efficiency: 0.15,
            cloud_cover: 0.0,
            specific_heat: 4186.0,
            transmittance: 0.9,
            absorptance: 0.95,
            heat_loss_coefficient: 8.0,
            pump_power: 50.0,
            hydraulic_head: 5.0,
            pump_efficiency: 0.7,
            tank_volume: 3.0,
            min_ambient_temp: 59.0,
            max_ambient_temp: 77.0,
            initial_fluid_temp: 68.0,
            initial_tank_temp: 68.0,
            start_hour: 0,
            duration: 24,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.check_physics()?;
        Ok(config)
    }

    fn check_physics(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        let positive = [
            ("fluid_density", p.fluid_density),
            ("gravity", p.gravity),
            ("peak_irradiance", p.peak_irradiance),
            ("time_step_seconds", p.time_step_seconds),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::Physics(format!("{name} must be positive, got {value}")));
        }
        let ordered = p.daylight_start_hour <= p.solar_noon_hour
            && p.solar_noon_hour < p.daylight_end_hour
            && p.daylight_end_hour <= 24;
        if !ordered {
            return Err(ConfigError::Physics(format!(
                "daylight window {}..{} with noon at {} is not a valid day",
                p.daylight_start_hour, p.daylight_end_hour, p.solar_noon_hour
            )));
        }
        Ok(())
    }
}
