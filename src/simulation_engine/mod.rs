// simulation_engine/mod.rs
pub mod simulation;

pub use simulation::{
    run_simulation, simulation_step, RunOutcome, SimulatorSession, StepReport, StopReason,
};
