// simulator/synthetic.rs
use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{PhaseDefinition, SimulatorClient};
use crate::error::SimulatorError;

/// Spacing between queued vehicles (vehicle length plus gap), in metres.
const QUEUE_SPACING: f64 = 7.5;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub traffic_lights: usize,
    pub lanes_per_light: usize,
    /// Total vehicles inserted over the run.
    pub vehicles: u32,
    /// Chance per lane per step that a vehicle arrives.
    pub arrival_probability: f64,
    /// Vehicles leaving a green lane per step.
    pub discharge_per_step: usize,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            traffic_lights: 2,
            lanes_per_light: 4,
            vehicles: 200,
            arrival_probability: 0.3,
            discharge_per_step: 2,
            seed: 42,
        }
    }
}

#[derive(Debug)]
struct Light {
    id: String,
    lanes: Vec<String>,
    phase: usize,
}

#[derive(Debug)]
struct Vehicle {
    distance: f64,
    waiting: f64,
}

/// In-process stand-in for the external simulator.
///
/// Each light has one phase per incoming lane and that phase turns only its
/// own lane green. Vehicles queue at the stop line, accumulate waiting time
/// while red and leave a few per step while green.
pub struct SyntheticSimulator {
    config: SyntheticConfig,
    rng: StdRng,
    lights: Vec<Light>,
    queues: HashMap<String, VecDeque<String>>,
    vehicles: HashMap<String, Vehicle>,
    spawned: u32,
    step: u64,
    closed: bool,
}

impl SyntheticSimulator {
    pub fn new(config: SyntheticConfig) -> Self {
        let mut lights = Vec::with_capacity(config.traffic_lights);
        let mut queues = HashMap::new();
        for t in 0..config.traffic_lights {
            let id = format!("J{}", t + 1);
            let lanes: Vec<String> = (0..config.lanes_per_light)
                .map(|l| format!("{}_in{}", id, l))
                .collect();
            for lane in &lanes {
                queues.insert(lane.clone(), VecDeque::new());
            }
            lights.push(Light {
                id,
                lanes,
                phase: 0,
            });
        }

        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            lights,
            queues,
            vehicles: HashMap::new(),
            spawned: 0,
            step: 0,
            closed: false,
        }
    }

    pub fn current_phase(&self, tl_id: &str) -> Option<usize> {
        self.lights.iter().find(|l| l.id == tl_id).map(|l| l.phase)
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), SimulatorError> {
        if self.closed {
            Err(SimulatorError::AlreadyClosed)
        } else {
            Ok(())
        }
    }

    fn rejected(command: &str, message: String) -> SimulatorError {
        SimulatorError::Command {
            command: command.to_string(),
            message,
        }
    }

    fn light(&self, command: &str, tl_id: &str) -> Result<&Light, SimulatorError> {
        self.lights
            .iter()
            .find(|l| l.id == tl_id)
            .ok_or_else(|| Self::rejected(command, format!("unknown traffic light '{}'", tl_id)))
    }

    fn vehicle(&self, command: &str, vehicle_id: &str) -> Result<&Vehicle, SimulatorError> {
        self.vehicles
            .get(vehicle_id)
            .ok_or_else(|| Self::rejected(command, format!("unknown vehicle '{}'", vehicle_id)))
    }

    fn spawn_arrivals(&mut self) {
        let probability = self.config.arrival_probability.clamp(0.0, 1.0);
        for light in &self.lights {
            for lane in &light.lanes {
                if self.spawned >= self.config.vehicles {
                    return;
                }
                if !self.rng.random_bool(probability) {
                    continue;
                }
                let queue = self.queues.entry(lane.clone()).or_default();
                let vehicle_id = format!("veh{}", self.spawned);
                self.vehicles.insert(
                    vehicle_id.clone(),
                    Vehicle {
                        distance: queue.len() as f64 * QUEUE_SPACING,
                        waiting: 0.0,
                    },
                );
                queue.push_back(vehicle_id);
                self.spawned += 1;
            }
        }
    }

    fn move_queues(&mut self) {
        for light in &self.lights {
            for (index, lane) in light.lanes.iter().enumerate() {
                let green = index == light.phase;
                let Some(queue) = self.queues.get_mut(lane) else {
                    continue;
                };
                if green {
                    for _ in 0..self.config.discharge_per_step {
                        match queue.pop_front() {
                            Some(departed) => {
                                self.vehicles.remove(&departed);
                            }
                            None => break,
                        }
                    }
                }
                for (position, vehicle_id) in queue.iter().enumerate() {
                    if let Some(vehicle) = self.vehicles.get_mut(vehicle_id) {
                        vehicle.distance = position as f64 * QUEUE_SPACING;
                        if green {
                            vehicle.waiting = 0.0;
                        } else {
                            vehicle.waiting += 1.0;
                        }
                    }
                }
            }
        }
    }
}

impl SimulatorClient for SyntheticSimulator {
    fn start(&mut self, config_path: &str) -> Result<(), SimulatorError> {
        self.ensure_open()?;
        log::info!(
            "Synthetic simulator started for '{}' ({} lights, {} vehicles)",
            config_path,
            self.config.traffic_lights,
            self.config.vehicles
        );
        Ok(())
    }

    fn advance_step(&mut self) -> Result<(), SimulatorError> {
        self.ensure_open()?;
        self.move_queues();
        self.spawn_arrivals();
        self.step += 1;
        Ok(())
    }

    fn min_expected_vehicles(&mut self) -> Result<u32, SimulatorError> {
        self.ensure_open()?;
        let pending = self.config.vehicles - self.spawned;
        Ok(pending + self.vehicles.len() as u32)
    }

    fn traffic_light_ids(&mut self) -> Result<Vec<String>, SimulatorError> {
        self.ensure_open()?;
        Ok(self.lights.iter().map(|l| l.id.clone()).collect())
    }

    fn program(&mut self, tl_id: &str) -> Result<Vec<PhaseDefinition>, SimulatorError> {
        self.ensure_open()?;
        let light = self.light("program", tl_id)?;
        let lanes = light.lanes.len();
        Ok((0..lanes)
            .map(|green| PhaseDefinition {
                state: (0..lanes)
                    .map(|i| if i == green { 'G' } else { 'r' })
                    .collect(),
                duration: 30.0,
            })
            .collect())
    }

    fn controlled_lane_groups(&mut self, tl_id: &str) -> Result<Vec<Vec<String>>, SimulatorError> {
        self.ensure_open()?;
        let light = self.light("controlled_lanes", tl_id)?;
        Ok(light.lanes.iter().map(|lane| vec![lane.clone()]).collect())
    }

    fn vehicle_ids(&mut self) -> Result<Vec<String>, SimulatorError> {
        self.ensure_open()?;
        let mut ids = Vec::with_capacity(self.vehicles.len());
        for light in &self.lights {
            for lane in &light.lanes {
                if let Some(queue) = self.queues.get(lane) {
                    ids.extend(queue.iter().cloned());
                }
            }
        }
        Ok(ids)
    }

    fn vehicles_on_lane(&mut self, lane_id: &str) -> Result<Vec<String>, SimulatorError> {
        self.ensure_open()?;
        self.queues
            .get(lane_id)
            .map(|queue| queue.iter().cloned().collect())
            .ok_or_else(|| Self::rejected("lane_vehicles", format!("unknown lane '{}'", lane_id)))
    }

    fn vehicle_distance_from_stop(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError> {
        self.ensure_open()?;
        Ok(self.vehicle("vehicle_distance", vehicle_id)?.distance)
    }

    fn vehicle_waiting_time(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError> {
        self.ensure_open()?;
        Ok(self.vehicle("vehicle_waiting_time", vehicle_id)?.waiting)
    }

    fn set_active_phase(&mut self, tl_id: &str, phase_index: usize) -> Result<(), SimulatorError> {
        self.ensure_open()?;
        let light = self
            .lights
            .iter_mut()
            .find(|l| l.id == tl_id)
            .ok_or_else(|| Self::rejected("set_phase", format!("unknown traffic light '{}'", tl_id)))?;
        if phase_index >= light.lanes.len() {
            return Err(Self::rejected(
                "set_phase",
                format!("phase {} out of range for '{}'", phase_index, tl_id),
            ));
        }
        light.phase = phase_index;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SimulatorError> {
        self.ensure_open()?;
        self.closed = true;
        log::info!("Synthetic simulator closed after {} steps", self.step);
        Ok(())
    }
}
