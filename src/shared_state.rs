use std::sync::Arc;

use crate::config::{Config, RequestDefaults};
use crate::services::simulation_engine::SimulationEngine;

/// Read-only state shared by every request.
///
/// Each simulation owns its own thermal state on its call stack; nothing here
/// is mutated after startup.
#[derive(Clone, Debug)]
pub struct AppState {
    pub engine: SimulationEngine,
    pub defaults: Arc<RequestDefaults>,
    pub max_steps: u32,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            engine: SimulationEngine::new(config.physics),
            defaults: Arc::new(config.defaults.clone()),
            max_steps: config.server.max_steps,
        }
    }
}
