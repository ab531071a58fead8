pub mod lenient;
pub mod request;
pub mod simulation;
