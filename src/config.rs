// config.rs
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::global_variables::{
    BRIDGE_ADDR, BRIDGE_CONNECT_ATTEMPTS, BRIDGE_CONNECT_DELAY_MS, BRIDGE_REQUEST_TIMEOUT_SECS,
    DASHBOARD_ADDR, DASHBOARD_POLL_SECS, DASHBOARD_TITLE, FIXED_LIGHT_WAIT_TIME, HEATMAP_FILE_NAME,
    MAX_SIMULATION_STEPS, MONITORING_RANGE, RESULTS_FOLDER, SIMULATION_CONFIG, SUMMARY_FILE_NAME,
};
use crate::simulator::bridge::BridgeOptions;
use crate::simulator::SyntheticConfig;

/// Settings for one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub sim_config: String,
    /// `None` runs until the simulator reports no vehicles left.
    pub max_steps: Option<u64>,
    pub monitoring_range: f64,
    pub baseline_wait: f64,
    pub results_dir: PathBuf,
}

impl SimulationConfig {
    pub fn summary_path(&self) -> PathBuf {
        self.results_dir.join(SUMMARY_FILE_NAME)
    }

    pub fn heatmap_path(&self) -> PathBuf {
        self.results_dir.join(HEATMAP_FILE_NAME)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sim_config: SIMULATION_CONFIG.to_string(),
            max_steps: Some(MAX_SIMULATION_STEPS),
            monitoring_range: MONITORING_RANGE,
            baseline_wait: FIXED_LIGHT_WAIT_TIME,
            results_dir: PathBuf::from(RESULTS_FOLDER),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub addr: String,
    pub summary_path: PathBuf,
    pub heatmap_path: PathBuf,
    pub poll_interval: Duration,
    pub title: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let results = PathBuf::from(RESULTS_FOLDER);
        Self {
            addr: DASHBOARD_ADDR.to_string(),
            summary_path: results.join(SUMMARY_FILE_NAME),
            heatmap_path: results.join(HEATMAP_FILE_NAME),
            poll_interval: Duration::from_secs(DASHBOARD_POLL_SECS),
            title: DASHBOARD_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// External simulator reached through the JSON bridge.
    Bridge,
    /// Built-in randomised simulator.
    Synthetic,
}

#[derive(Parser, Debug)]
#[command(name = "simulation_main")]
#[command(about = "Runs density-based traffic light control against a simulator")]
pub struct SimulationArgs {
    /// Simulation configuration file handed to the simulator
    #[arg(long, env = "TRAFFIC_SIM_CONFIG", default_value = SIMULATION_CONFIG)]
    pub sim_config: String,

    #[arg(long, value_enum, env = "TRAFFIC_BACKEND", default_value_t = Backend::Bridge)]
    pub backend: Backend,

    #[arg(long, env = "TRAFFIC_BRIDGE_ADDR", default_value = BRIDGE_ADDR)]
    pub bridge_addr: String,

    /// Bridge program to start before connecting
    #[arg(long, env = "TRAFFIC_BRIDGE_LAUNCH")]
    pub launch: Option<String>,

    /// Seconds to wait for each bridge reply, 0 to wait indefinitely
    #[arg(long, env = "TRAFFIC_BRIDGE_TIMEOUT", default_value_t = BRIDGE_REQUEST_TIMEOUT_SECS)]
    pub request_timeout: u64,

    /// Step ceiling, 0 for no ceiling
    #[arg(long, env = "TRAFFIC_MAX_STEPS", default_value_t = MAX_SIMULATION_STEPS)]
    pub max_steps: u64,

    /// Distance from the stop line within which a vehicle counts, in metres
    #[arg(long, default_value_t = MONITORING_RANGE)]
    pub monitoring_range: f64,

    /// Average wait of a fixed-timing system, in seconds
    #[arg(long, default_value_t = FIXED_LIGHT_WAIT_TIME, value_parser = parse_positive_secs)]
    pub baseline_wait: f64,

    #[arg(long, env = "TRAFFIC_RESULTS_DIR", default_value = RESULTS_FOLDER)]
    pub results_dir: PathBuf,

    #[arg(long, default_value_t = 2)]
    pub synthetic_lights: usize,

    #[arg(long, default_value_t = 4)]
    pub synthetic_lanes: usize,

    #[arg(long, default_value_t = 200)]
    pub synthetic_vehicles: u32,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl SimulationArgs {
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            sim_config: self.sim_config.clone(),
            max_steps: (self.max_steps > 0).then_some(self.max_steps),
            monitoring_range: self.monitoring_range,
            baseline_wait: self.baseline_wait,
            results_dir: self.results_dir.clone(),
        }
    }

    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            addr: self.bridge_addr.clone(),
            launch: self.launch.clone(),
            connect_attempts: BRIDGE_CONNECT_ATTEMPTS,
            connect_delay: Duration::from_millis(BRIDGE_CONNECT_DELAY_MS),
            request_timeout: (self.request_timeout > 0)
                .then(|| Duration::from_secs(self.request_timeout)),
        }
    }

    pub fn synthetic_config(&self) -> SyntheticConfig {
        SyntheticConfig {
            traffic_lights: self.synthetic_lights,
            lanes_per_light: self.synthetic_lanes,
            vehicles: self.synthetic_vehicles,
            seed: self.seed,
            ..SyntheticConfig::default()
        }
    }
}

fn parse_positive_secs(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(format!("expected a positive number of seconds, got {}", value))
    }
}

#[derive(Parser, Debug)]
#[command(name = "dashboard_main")]
#[command(about = "Serves the traffic summary dashboard")]
pub struct DashboardArgs {
    #[arg(long, env = "TRAFFIC_DASHBOARD_ADDR", default_value = DASHBOARD_ADDR)]
    pub addr: String,

    /// Folder the simulation writes its summary and heatmap to
    #[arg(long, env = "TRAFFIC_RESULTS_DIR", default_value = RESULTS_FOLDER)]
    pub results_dir: PathBuf,

    /// Seconds between page refreshes
    #[arg(long, default_value_t = DASHBOARD_POLL_SECS)]
    pub poll_secs: u64,
}

impl DashboardArgs {
    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            addr: self.addr.clone(),
            summary_path: self.results_dir.join(SUMMARY_FILE_NAME),
            heatmap_path: self.results_dir.join(HEATMAP_FILE_NAME),
            poll_interval: Duration::from_secs(self.poll_secs.max(1)),
            title: DASHBOARD_TITLE.to_string(),
        }
    }
}
