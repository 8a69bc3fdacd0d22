pub mod config;
pub mod error;
pub mod recommendations;
pub mod roadmap;
pub mod telemetry;
