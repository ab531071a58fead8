pub mod collector;
pub mod fluid;
pub mod irradiance;
pub mod mass_flow;
pub mod request_mapper;
pub mod simulation_engine;
pub mod tank;
pub mod units;
