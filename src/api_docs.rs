use utoipa::OpenApi;
use crate::controllers::simulation_controller;
use crate::models::request;

#[derive(OpenApi)]
#[openapi(
    paths(
        simulation_controller::simulate
    ),
    components(
        schemas(
            request::SimulationRequest,
            request::ParameterChangeRequest,
            request::PriorStateRequest,
            request::TemperatureReading,
            request::SimulationResponse
        )
    ),
    tags(
        (name = "solar-thermal-sim", description = "Solar collector and storage tank simulation API")
    )
)]
pub struct ApiDoc;
