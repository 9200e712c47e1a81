pub mod layout;
pub mod orchestrator;
pub mod params;
pub mod projector;
