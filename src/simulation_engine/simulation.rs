// simulation.rs
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::SimulationConfig;
use crate::control_system::traffic_light_controller::DensityController;
use crate::error::{SimulatorError, TrafficLightError};
use crate::flow_analyzer::{lane_averages, log_summary, summarize, MetricsCollector, TrafficSummary};
use crate::monitoring::{ensure_results_folder, write_heatmap, write_summary};
use crate::simulator::SimulatorClient;

/// Keeps the simulator connection for the duration of a run and closes it
/// exactly once, on `close()` or on drop.
pub struct SimulatorSession<'a, C: SimulatorClient + ?Sized> {
    client: &'a mut C,
    closed: bool,
}

impl<'a, C: SimulatorClient + ?Sized> SimulatorSession<'a, C> {
    pub fn start(client: &'a mut C, config_path: &str) -> Result<Self, SimulatorError> {
        log::info!("Starting simulation with {}", config_path);
        let session = Self {
            client,
            closed: false,
        };
        session.client.start(config_path)?;
        Ok(session)
    }

    pub fn client(&mut self) -> &mut C {
        self.client
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.client.close() {
            Ok(()) => log::info!("Simulation connection closed"),
            Err(SimulatorError::AlreadyClosed) => {
                log::warn!("Simulator was already closed or not connected")
            }
            Err(e) => log::warn!("Error while closing simulator: {}", e),
        }
    }
}

impl<C: SimulatorClient + ?Sized> Drop for SimulatorSession<'_, C> {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NoVehiclesLeft,
    StepCeiling,
    Interrupted,
    SimulatorFailure,
}

/// Per-item failures that were logged and skipped during one step.
#[derive(Debug, Default)]
pub struct StepReport {
    pub light_errors: Vec<TrafficLightError>,
    /// Vehicles whose waiting time could not be read.
    pub skipped_waits: usize,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub steps: u64,
    pub stop_reason: StopReason,
    pub summary: TrafficSummary,
    /// Traffic light failures that were logged and skipped, over all steps.
    pub light_errors: usize,
    pub skipped_waits: usize,
    pub fatal_error: Option<SimulatorError>,
    pub reports_written: bool,
}

/// Advances one step, records every vehicle's waiting time and runs the
/// density controller on every traffic light.
///
/// A light or vehicle whose query fails is skipped and counted in the
/// report. A fatal connection error aborts the step.
pub fn simulation_step<C: SimulatorClient + ?Sized>(
    client: &mut C,
    controller: &DensityController,
    metrics: &mut MetricsCollector,
) -> Result<StepReport, SimulatorError> {
    client.advance_step()?;

    let mut report = StepReport::default();
    for vehicle_id in client.vehicle_ids()? {
        match client.vehicle_waiting_time(&vehicle_id) {
            Ok(wait) => metrics.record_wait_time(&vehicle_id, wait),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::debug!("Skipping waiting time of {}: {}", vehicle_id, e);
                report.skipped_waits += 1;
            }
        }
    }

    for tl_id in client.traffic_light_ids()? {
        match controller.control(client, &tl_id, metrics) {
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e.source),
            Err(e) => report.light_errors.push(e),
        }
    }
    Ok(report)
}

fn write_reports(
    config: &SimulationConfig,
    summary: &TrafficSummary,
    metrics: &MetricsCollector,
) -> bool {
    if let Err(e) = ensure_results_folder(&config.results_dir) {
        log::error!("{}", e);
        return false;
    }
    let mut ok = true;
    if let Err(e) = write_summary(&config.summary_path(), summary) {
        log::error!("Failed to save traffic summary: {}", e);
        ok = false;
    }
    let heatmap = config.heatmap_path();
    match write_heatmap(&heatmap, &lane_averages(metrics.lane_series())) {
        Ok(()) => log::info!("Final congestion heatmap saved at: {}", heatmap.display()),
        Err(e) => {
            log::error!("Failed to save congestion heatmap: {}", e);
            ok = false;
        }
    }
    ok
}

/// Drives the simulator until it runs out of vehicles, hits the step ceiling,
/// is interrupted through `stop`, or loses its connection. Whatever ends the
/// loop, the summary is produced once and the simulator is then closed.
///
/// Only a failure to start the simulation returns `Err`.
pub fn run_simulation<C: SimulatorClient + ?Sized>(
    client: &mut C,
    config: &SimulationConfig,
    stop: &AtomicBool,
) -> Result<RunOutcome, SimulatorError> {
    let mut session = SimulatorSession::start(client, &config.sim_config)?;
    let controller = DensityController::new(config.monitoring_range);
    let mut metrics = MetricsCollector::new();
    let mut steps = 0u64;
    let mut light_errors = 0usize;
    let mut skipped_waits = 0usize;

    let (stop_reason, fatal_error) = loop {
        if stop.load(Ordering::SeqCst) {
            log::info!("Interrupted, stopping simulation early");
            break (StopReason::Interrupted, None);
        }
        if config.max_steps.is_some_and(|max| steps >= max) {
            log::info!("Reached step ceiling of {}", steps);
            break (StopReason::StepCeiling, None);
        }
        match session.client().min_expected_vehicles() {
            Ok(0) => {
                log::info!("Simulator reported no more vehicles, stopping");
                break (StopReason::NoVehiclesLeft, None);
            }
            Ok(_) => {}
            Err(e) => break (StopReason::SimulatorFailure, Some(e)),
        }

        match simulation_step(session.client(), &controller, &mut metrics) {
            Ok(report) => {
                steps += 1;
                log::debug!("Step: {}", steps);
                for e in &report.light_errors {
                    log::warn!("Error processing {}", e);
                }
                light_errors += report.light_errors.len();
                skipped_waits += report.skipped_waits;
            }
            Err(e) => break (StopReason::SimulatorFailure, Some(e)),
        }
    };

    if let Some(e) = &fatal_error {
        log::error!("Simulator connection failed after {} steps: {}", steps, e);
    }

    log::info!("Generating traffic summary before ending simulation");
    let summary = summarize(&metrics, config.baseline_wait);
    log_summary(&summary);
    let reports_written = write_reports(config, &summary, &metrics);

    session.close();
    log::info!("Simulation ended after {} steps", steps);

    Ok(RunOutcome {
        steps,
        stop_reason,
        summary,
        light_errors,
        skipped_waits,
        fatal_error,
        reports_written,
    })
}
