pub mod traffic_light_controller;

pub use traffic_light_controller::{decide, select_phase, DensityController, PhaseDecision, SkipReason};
