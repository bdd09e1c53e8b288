// Density heuristic
pub const MONITORING_RANGE: f64 = 10.0; // metres from the stop line

// Assumed average delay of a fixed-timing signal system, in seconds
pub const FIXED_LIGHT_WAIT_TIME: f64 = 40.0;

// Step loop
pub const MAX_SIMULATION_STEPS: u64 = 100;
pub const SIMULATION_CONFIG: &str = "rjy_simulation.sumocfg";

// Output artifacts
pub const RESULTS_FOLDER: &str = "results";
pub const SUMMARY_FILE_NAME: &str = "traffic_summary.csv";
pub const HEATMAP_FILE_NAME: &str = "congestion_heatmap.png";
pub const BOTTLENECK_LANE_COUNT: usize = 3;

// Simulator bridge
pub const BRIDGE_ADDR: &str = "127.0.0.1:8813";
pub const BRIDGE_CONNECT_ATTEMPTS: u32 = 20;
pub const BRIDGE_CONNECT_DELAY_MS: u64 = 250;
pub const BRIDGE_REQUEST_TIMEOUT_SECS: u64 = 60;

// Dashboard
pub const DASHBOARD_ADDR: &str = "127.0.0.1:8050";
pub const DASHBOARD_POLL_SECS: u64 = 5;
pub const DASHBOARD_TITLE: &str = "Traffic Management Dashboard";
