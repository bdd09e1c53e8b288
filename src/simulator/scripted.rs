// Test double that serves a fixed network state and records phase changes.
use std::collections::HashMap;
use std::io;

use super::{PhaseDefinition, SimulatorClient};
use crate::error::SimulatorError;

#[derive(Debug, Default, Clone)]
pub struct ScriptedLight {
    pub num_phases: usize,
    pub groups: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
pub struct ScriptedSimulator {
    pub lights: Vec<(String, ScriptedLight)>,
    /// Vehicles on each lane as (id, distance from stop line).
    pub lanes: HashMap<String, Vec<(String, f64)>>,
    pub waiting: Vec<(String, f64)>,
    /// Value reported by `min_expected_vehicles`; the run ends when it hits 0.
    pub expected: u32,
    pub failing_lights: Vec<String>,
    /// Vehicles whose waiting time query is rejected.
    pub failing_vehicles: Vec<String>,
    /// Step number at which `advance_step` reports a dropped connection.
    pub fatal_at_step: Option<u64>,
    pub steps: u64,
    pub set_phase_calls: Vec<(String, usize)>,
    pub started_with: Option<String>,
    pub close_calls: usize,
    closed: bool,
}

impl ScriptedSimulator {
    pub fn with_light(mut self, tl_id: &str, num_phases: usize, groups: &[&[&str]]) -> Self {
        self.lights.push((
            tl_id.to_string(),
            ScriptedLight {
                num_phases,
                groups: groups
                    .iter()
                    .map(|g| g.iter().map(|s| s.to_string()).collect())
                    .collect(),
            },
        ));
        self
    }

    pub fn with_lane(mut self, lane_id: &str, vehicles: &[(&str, f64)]) -> Self {
        self.lanes.insert(
            lane_id.to_string(),
            vehicles.iter().map(|(v, d)| (v.to_string(), *d)).collect(),
        );
        self
    }

    fn light(&self, tl_id: &str) -> Result<&ScriptedLight, SimulatorError> {
        if self.failing_lights.iter().any(|f| f == tl_id) {
            return Err(SimulatorError::Command {
                command: "program".to_string(),
                message: format!("cannot read program of '{}'", tl_id),
            });
        }
        self.lights
            .iter()
            .find(|(id, _)| id == tl_id)
            .map(|(_, l)| l)
            .ok_or_else(|| SimulatorError::Command {
                command: "program".to_string(),
                message: format!("unknown traffic light '{}'", tl_id),
            })
    }

    fn check_open(&self) -> Result<(), SimulatorError> {
        if self.closed {
            Err(SimulatorError::AlreadyClosed)
        } else {
            Ok(())
        }
    }
}

impl SimulatorClient for ScriptedSimulator {
    fn start(&mut self, config_path: &str) -> Result<(), SimulatorError> {
        self.started_with = Some(config_path.to_string());
        Ok(())
    }

    fn advance_step(&mut self) -> Result<(), SimulatorError> {
        self.check_open()?;
        if self.fatal_at_step == Some(self.steps) {
            return Err(SimulatorError::Connection(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "simulator went away",
            )));
        }
        self.steps += 1;
        Ok(())
    }

    fn min_expected_vehicles(&mut self) -> Result<u32, SimulatorError> {
        self.check_open()?;
        Ok(self.expected)
    }

    fn traffic_light_ids(&mut self) -> Result<Vec<String>, SimulatorError> {
        self.check_open()?;
        Ok(self.lights.iter().map(|(id, _)| id.clone()).collect())
    }

    fn program(&mut self, tl_id: &str) -> Result<Vec<PhaseDefinition>, SimulatorError> {
        let light = self.light(tl_id)?;
        Ok((0..light.num_phases)
            .map(|i| PhaseDefinition {
                state: format!("phase{}", i),
                duration: 10.0,
            })
            .collect())
    }

    fn controlled_lane_groups(&mut self, tl_id: &str) -> Result<Vec<Vec<String>>, SimulatorError> {
        Ok(self.light(tl_id)?.groups.clone())
    }

    fn vehicle_ids(&mut self) -> Result<Vec<String>, SimulatorError> {
        Ok(self.waiting.iter().map(|(id, _)| id.clone()).collect())
    }

    fn vehicles_on_lane(&mut self, lane_id: &str) -> Result<Vec<String>, SimulatorError> {
        Ok(self
            .lanes
            .get(lane_id)
            .map(|vs| vs.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default())
    }

    fn vehicle_distance_from_stop(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError> {
        self.lanes
            .values()
            .flatten()
            .find(|(id, _)| id == vehicle_id)
            .map(|(_, d)| *d)
            .ok_or_else(|| SimulatorError::Command {
                command: "vehicle_distance".to_string(),
                message: format!("unknown vehicle '{}'", vehicle_id),
            })
    }

    fn vehicle_waiting_time(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError> {
        if self.failing_vehicles.iter().any(|v| v == vehicle_id) {
            return Err(SimulatorError::Command {
                command: "vehicle_waiting_time".to_string(),
                message: format!("vehicle '{}' is not known", vehicle_id),
            });
        }
        Ok(self
            .waiting
            .iter()
            .find(|(id, _)| id == vehicle_id)
            .map(|(_, w)| *w)
            .unwrap_or(0.0))
    }

    fn set_active_phase(&mut self, tl_id: &str, phase_index: usize) -> Result<(), SimulatorError> {
        self.set_phase_calls.push((tl_id.to_string(), phase_index));
        Ok(())
    }

    fn close(&mut self) -> Result<(), SimulatorError> {
        self.close_calls += 1;
        self.check_open()?;
        self.closed = true;
        Ok(())
    }
}
