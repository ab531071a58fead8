use axum::{routing::post, Router};

use crate::controllers::simulation_controller::simulate;
use crate::shared_state::AppState;

/// Build the `/api/*` router.
pub fn simulation_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/simulate", post(simulate))
        .with_state(state)
}
