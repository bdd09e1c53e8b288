pub mod metrics;
pub mod traffic_analyzer;

pub use metrics::{LaneCongestionSeries, MetricsCollector};
pub use traffic_analyzer::{
    bottleneck_lanes, efficiency_percentage, lane_averages, log_summary, summarize, LaneLoad,
    TrafficSummary,
};
