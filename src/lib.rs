//! Density-based traffic light control driven through an external traffic
//! simulator, with an end-of-run efficiency summary and a read-only dashboard.

pub mod config;
pub mod control_system;
pub mod dashboard;
pub mod error;
pub mod flow_analyzer;
pub mod global_variables;
pub mod monitoring;
pub mod simulation_engine;
pub mod simulator;
