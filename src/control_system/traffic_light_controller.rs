use crate::error::{SimulatorError, TrafficLightError};
use crate::flow_analyzer::MetricsCollector;
use crate::simulator::SimulatorClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoProgram,
    NoControlledLanes,
}

/// What the controller did with one traffic light on one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseDecision {
    /// A set-phase request was issued.
    Switched { phase: usize, vehicles: u32 },
    /// No vehicle near any stop line; the simulator keeps its phase.
    KeptCurrent,
    /// The densest group has no matching phase in the program.
    OutOfRange { phase: usize, num_phases: usize },
    Skipped(SkipReason),
}

/// Index of the busiest lane group. The first group wins a tie and an all-zero
/// scan selects nothing.
pub fn select_phase(densities: &[(usize, u32)]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for &(index, count) in densities {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((index, count)),
        }
    }
    best.filter(|&(_, count)| count > 0)
}

pub fn decide(densities: &[(usize, u32)], num_phases: usize) -> PhaseDecision {
    match select_phase(densities) {
        None => PhaseDecision::KeptCurrent,
        Some((phase, _)) if phase >= num_phases => PhaseDecision::OutOfRange { phase, num_phases },
        Some((phase, vehicles)) => PhaseDecision::Switched { phase, vehicles },
    }
}

/// Gives green to whichever controlled lane has the most vehicles waiting
/// close to its stop line.
///
/// The switch is a single set-phase request. No yellow or clearance phase is
/// inserted between the old and the new green.
#[derive(Debug, Clone)]
pub struct DensityController {
    monitoring_range: f64,
}

impl DensityController {
    pub fn new(monitoring_range: f64) -> Self {
        Self { monitoring_range }
    }

    pub fn monitoring_range(&self) -> f64 {
        self.monitoring_range
    }

    fn vehicles_near_stop<C: SimulatorClient + ?Sized>(
        &self,
        client: &mut C,
        lane_id: &str,
    ) -> Result<u32, SimulatorError> {
        let mut count = 0;
        for vehicle_id in client.vehicles_on_lane(lane_id)? {
            if client.vehicle_distance_from_stop(&vehicle_id)? <= self.monitoring_range {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Vehicle count per link index, measured on the first lane of each
    /// non-empty group. Every count is also appended to that lane's series.
    pub fn lane_densities<C: SimulatorClient + ?Sized>(
        &self,
        client: &mut C,
        groups: &[Vec<String>],
        metrics: &mut MetricsCollector,
    ) -> Result<Vec<(usize, u32)>, SimulatorError> {
        let mut densities = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            let Some(lane_id) = group.first() else {
                continue;
            };
            let count = self.vehicles_near_stop(client, lane_id)?;
            metrics.record_lane_count(lane_id, count);
            densities.push((index, count));
        }
        Ok(densities)
    }

    pub fn control<C: SimulatorClient + ?Sized>(
        &self,
        client: &mut C,
        tl_id: &str,
        metrics: &mut MetricsCollector,
    ) -> Result<PhaseDecision, TrafficLightError> {
        self.control_inner(client, tl_id, metrics)
            .map_err(|source| TrafficLightError {
                tl_id: tl_id.to_string(),
                source,
            })
    }

    fn control_inner<C: SimulatorClient + ?Sized>(
        &self,
        client: &mut C,
        tl_id: &str,
        metrics: &mut MetricsCollector,
    ) -> Result<PhaseDecision, SimulatorError> {
        let program = client.program(tl_id)?;
        if program.is_empty() {
            log::debug!("No program logic found for traffic light {}", tl_id);
            return Ok(PhaseDecision::Skipped(SkipReason::NoProgram));
        }
        let num_phases = program.len();
        log::debug!("Traffic light {} has {} phases", tl_id, num_phases);

        let groups = client.controlled_lane_groups(tl_id)?;
        if groups.is_empty() {
            log::debug!("No controlled links for traffic light {}", tl_id);
            return Ok(PhaseDecision::Skipped(SkipReason::NoControlledLanes));
        }

        let densities = self.lane_densities(client, &groups, metrics)?;
        log::debug!("Lane densities for {}: {:?}", tl_id, densities);

        let decision = decide(&densities, num_phases);
        match decision {
            PhaseDecision::Switched { phase, vehicles } => {
                client.set_active_phase(tl_id, phase)?;
                log::debug!(
                    "[{}] Green for phase {} with {} vehicles",
                    tl_id,
                    phase,
                    vehicles
                );
            }
            PhaseDecision::OutOfRange { phase, num_phases } => {
                log::warn!(
                    "[{}] Invalid phase index {} (program has {} phases)",
                    tl_id,
                    phase,
                    num_phases
                );
            }
            PhaseDecision::KeptCurrent => {
                log::debug!("[{}] No vehicles detected, keeping current phase", tl_id);
            }
            PhaseDecision::Skipped(_) => {}
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global_variables::MONITORING_RANGE;
    use crate::simulator::scripted::ScriptedSimulator;

    fn controller() -> DensityController {
        DensityController::new(MONITORING_RANGE)
    }

    #[test]
    fn selects_busiest_group() {
        assert_eq!(select_phase(&[(0, 1), (1, 4), (2, 2)]), Some((1, 4)));
    }

    #[test]
    fn tie_goes_to_lowest_index() {
        assert_eq!(select_phase(&[(0, 2), (1, 5), (2, 5), (3, 5)]), Some((1, 5)));
    }

    #[test]
    fn all_zero_selects_nothing() {
        assert_eq!(select_phase(&[(0, 0), (1, 0)]), None);
        assert_eq!(select_phase(&[]), None);
        assert_eq!(decide(&[(0, 0), (1, 0)], 2), PhaseDecision::KeptCurrent);
    }

    #[test]
    fn out_of_range_index_is_not_a_switch() {
        assert_eq!(
            decide(&[(0, 1), (3, 2)], 3),
            PhaseDecision::OutOfRange { phase: 3, num_phases: 3 }
        );
    }

    #[test]
    fn switches_to_densest_phase() {
        let mut sim = ScriptedSimulator::default()
            .with_light("J1", 2, &[&["north_0"], &["east_0"]])
            .with_lane("north_0", &[("a", 2.0)])
            .with_lane("east_0", &[("b", 1.0), ("c", 9.5)]);
        let mut metrics = MetricsCollector::new();

        let decision = controller().control(&mut sim, "J1", &mut metrics).unwrap();

        assert_eq!(decision, PhaseDecision::Switched { phase: 1, vehicles: 2 });
        assert_eq!(sim.set_phase_calls, vec![("J1".to_string(), 1)]);
        assert_eq!(metrics.lane_series().len(), 2);
    }

    #[test]
    fn switches_straight_to_target_without_transition_phase() {
        // Known simplification: one set-phase request, no yellow in between.
        let mut sim = ScriptedSimulator::default()
            .with_light("J1", 4, &[&["a_0"], &["b_0"], &["c_0"], &["d_0"]])
            .with_lane("d_0", &[("v", 0.0)]);

        controller()
            .control(&mut sim, "J1", &mut MetricsCollector::new())
            .unwrap();

        assert_eq!(sim.set_phase_calls, vec![("J1".to_string(), 3)]);
    }

    #[test]
    fn only_vehicles_within_range_count() {
        let mut sim = ScriptedSimulator::default()
            .with_light("J1", 2, &[&["a_0"], &["b_0"]])
            .with_lane("a_0", &[("edge", 10.0)])
            .with_lane("b_0", &[("far1", 10.5), ("far2", 40.0)]);
        let mut metrics = MetricsCollector::new();

        let decision = controller().control(&mut sim, "J1", &mut metrics).unwrap();

        assert_eq!(decision, PhaseDecision::Switched { phase: 0, vehicles: 1 });
        assert_eq!(metrics.lane_series()[1].samples, vec![0]);
    }

    #[test]
    fn empty_lanes_keep_current_phase() {
        let mut sim = ScriptedSimulator::default()
            .with_light("J1", 2, &[&["a_0"], &["b_0"]])
            .with_lane("a_0", &[("far", 25.0)]);

        let decision = controller()
            .control(&mut sim, "J1", &mut MetricsCollector::new())
            .unwrap();

        assert_eq!(decision, PhaseDecision::KeptCurrent);
        assert!(sim.set_phase_calls.is_empty());
    }

    #[test]
    fn out_of_range_phase_never_reaches_simulator() {
        // Three links but only two phases: link 2 has no phase of its own.
        let mut sim = ScriptedSimulator::default()
            .with_light("J1", 2, &[&["a_0"], &["b_0"], &["c_0"]])
            .with_lane("c_0", &[("v1", 1.0), ("v2", 3.0)]);

        let decision = controller()
            .control(&mut sim, "J1", &mut MetricsCollector::new())
            .unwrap();

        assert_eq!(decision, PhaseDecision::OutOfRange { phase: 2, num_phases: 2 });
        assert!(sim.set_phase_calls.is_empty());
    }

    #[test]
    fn empty_link_keeps_later_indices() {
        let mut sim = ScriptedSimulator::default()
            .with_light("J1", 3, &[&[], &["b_0"], &["c_0"]])
            .with_lane("c_0", &[("v", 0.5)]);
        let mut metrics = MetricsCollector::new();

        controller().control(&mut sim, "J1", &mut metrics).unwrap();

        assert_eq!(sim.set_phase_calls, vec![("J1".to_string(), 2)]);
        assert_eq!(metrics.lane_series().len(), 2);
    }

    #[test]
    fn light_without_program_is_skipped() {
        let mut sim = ScriptedSimulator::default().with_light("J1", 0, &[&["a_0"]]);
        let decision = controller()
            .control(&mut sim, "J1", &mut MetricsCollector::new())
            .unwrap();
        assert_eq!(decision, PhaseDecision::Skipped(SkipReason::NoProgram));
    }

    #[test]
    fn light_without_links_is_skipped() {
        let mut sim = ScriptedSimulator::default().with_light("J1", 2, &[]);
        let decision = controller()
            .control(&mut sim, "J1", &mut MetricsCollector::new())
            .unwrap();
        assert_eq!(decision, PhaseDecision::Skipped(SkipReason::NoControlledLanes));
    }

    #[test]
    fn simulator_rejection_is_reported_per_light() {
        let mut sim = ScriptedSimulator::default().with_light("J1", 2, &[&["a_0"]]);
        sim.failing_lights.push("J1".to_string());

        let err = controller()
            .control(&mut sim, "J1", &mut MetricsCollector::new())
            .unwrap_err();

        assert_eq!(err.tl_id, "J1");
        assert!(!err.is_fatal());
    }
}
