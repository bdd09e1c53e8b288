// simulator/mod.rs
pub mod bridge;
pub mod synthetic;

#[cfg(test)]
pub(crate) mod scripted;

use serde::{Deserialize, Serialize};

use crate::error::SimulatorError;

pub use bridge::BridgeClient;
pub use synthetic::{SyntheticConfig, SyntheticSimulator};

/// One signal state of a traffic light program, e.g. "GGrrGGrr".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDefinition {
    pub state: String,
    #[serde(default)]
    pub duration: f64,
}

/// Request/response control interface of the external traffic simulator.
///
/// Every call blocks until the simulator answers. Implementations report a
/// broken connection through a fatal [`SimulatorError`]; a request the
/// simulator refuses comes back as [`SimulatorError::Command`].
pub trait SimulatorClient {
    /// Loads the named simulation configuration.
    fn start(&mut self, config_path: &str) -> Result<(), SimulatorError>;

    /// Advances simulation time by one step.
    fn advance_step(&mut self) -> Result<(), SimulatorError>;

    /// Vehicles still running plus vehicles waiting to be inserted.
    fn min_expected_vehicles(&mut self) -> Result<u32, SimulatorError>;

    fn traffic_light_ids(&mut self) -> Result<Vec<String>, SimulatorError>;

    /// Phases of the light's first program, in order. Empty when the light has
    /// no program logic.
    fn program(&mut self, tl_id: &str) -> Result<Vec<PhaseDefinition>, SimulatorError>;

    /// One lane group per link index. The first lane of a group is the
    /// incoming lane that gets monitored; a group may be empty.
    fn controlled_lane_groups(&mut self, tl_id: &str) -> Result<Vec<Vec<String>>, SimulatorError>;

    /// Every vehicle present in the network at the current step.
    fn vehicle_ids(&mut self) -> Result<Vec<String>, SimulatorError>;

    fn vehicles_on_lane(&mut self, lane_id: &str) -> Result<Vec<String>, SimulatorError>;

    fn vehicle_distance_from_stop(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError>;

    /// Time the vehicle has spent standing, as reported this step.
    fn vehicle_waiting_time(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError>;

    fn set_active_phase(&mut self, tl_id: &str, phase_index: usize) -> Result<(), SimulatorError>;

    /// Shuts the simulator down. Returns [`SimulatorError::AlreadyClosed`]
    /// on a second call.
    fn close(&mut self) -> Result<(), SimulatorError>;
}

impl<T: SimulatorClient + ?Sized> SimulatorClient for Box<T> {
    fn start(&mut self, config_path: &str) -> Result<(), SimulatorError> {
        (**self).start(config_path)
    }
    fn advance_step(&mut self) -> Result<(), SimulatorError> {
        (**self).advance_step()
    }
    fn min_expected_vehicles(&mut self) -> Result<u32, SimulatorError> {
        (**self).min_expected_vehicles()
    }
    fn traffic_light_ids(&mut self) -> Result<Vec<String>, SimulatorError> {
        (**self).traffic_light_ids()
    }
    fn program(&mut self, tl_id: &str) -> Result<Vec<PhaseDefinition>, SimulatorError> {
        (**self).program(tl_id)
    }
    fn controlled_lane_groups(&mut self, tl_id: &str) -> Result<Vec<Vec<String>>, SimulatorError> {
        (**self).controlled_lane_groups(tl_id)
    }
    fn vehicle_ids(&mut self) -> Result<Vec<String>, SimulatorError> {
        (**self).vehicle_ids()
    }
    fn vehicles_on_lane(&mut self, lane_id: &str) -> Result<Vec<String>, SimulatorError> {
        (**self).vehicles_on_lane(lane_id)
    }
    fn vehicle_distance_from_stop(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError> {
        (**self).vehicle_distance_from_stop(vehicle_id)
    }
    fn vehicle_waiting_time(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError> {
        (**self).vehicle_waiting_time(vehicle_id)
    }
    fn set_active_phase(&mut self, tl_id: &str, phase_index: usize) -> Result<(), SimulatorError> {
        (**self).set_active_phase(tl_id, phase_index)
    }
    fn close(&mut self) -> Result<(), SimulatorError> {
        (**self).close()
    }
}
