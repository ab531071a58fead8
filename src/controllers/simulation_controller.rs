use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::models::request::{SimulationRequest, SimulationResponse};
use crate::services::request_mapper::{to_engine_inputs, to_response};
use crate::shared_state::AppState;

/// POST /api/simulate
/// Run the collector / tank simulation
///
/// Simulates steps `startStep..duration` hour by hour and returns the fluid,
/// plate, tank and ambient temperature after each step, in °F. Unreadable
/// fields fall back to their defaults; out-of-range values are rejected.
#[utoipa::path(
    post,
    path = "/api/simulate",
    request_body = SimulationRequest,
    responses(
        (status = 200, description = "Temperatures for every simulated step", body = SimulationResponse),
        (status = 400, description = "Body is not valid JSON"),
        (status = 415, description = "Missing JSON content type"),
        (status = 422, description = "A parameter is outside its physical range, or the body is not an object")
    )
)]
pub async fn simulate(
    State(state): State<AppState>,
    payload: Result<Json<SimulationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let inputs = to_engine_inputs(&request, &state.defaults, state.max_steps)?;

    let outcome = state.engine.simulate(
        &inputs.parameters,
        &inputs.schedule,
        inputs.start,
        inputs.prior,
        inputs.start_step,
        inputs.duration,
    );

    if let Some(first) = outcome.results.iter().find(|s| !s.is_finite()) {
        warn!(step = first.step, "simulation produced non-finite temperatures");
    }
    info!(
        steps = outcome.results.len(),
        overrides = inputs.schedule.len(),
        resumed = inputs.prior.is_some(),
        "simulation completed"
    );

    Ok(Json(to_response(&outcome, chrono::Utc::now())))
}
