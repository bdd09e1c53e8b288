// traffic_analyzer.rs
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::metrics::{LaneCongestionSeries, MetricsCollector};
use crate::global_variables::BOTTLENECK_LANE_COUNT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneLoad {
    pub lane: String,
    pub avg_vehicles: f64,
}

/// End-of-run efficiency figures, the content of the summary artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSummary {
    pub total_vehicles: usize,
    pub average_wait: f64,
    pub max_wait: f64,
    pub efficiency: f64,
    pub bottlenecks: Vec<LaneLoad>,
}

/// Time saved relative to a fixed-timing signal with `baseline` average delay.
/// Negative when the adaptive run waited longer than the baseline.
pub fn efficiency_percentage(average_wait: f64, baseline: f64) -> f64 {
    (baseline - average_wait) / baseline * 100.0
}

/// Mean count per lane, in the order lanes were first observed.
pub fn lane_averages(series: &[LaneCongestionSeries]) -> Vec<LaneLoad> {
    series
        .iter()
        .map(|s| LaneLoad {
            lane: s.lane_id.clone(),
            avg_vehicles: s.average(),
        })
        .collect()
}

/// The `limit` most congested lanes, highest mean first. Equal means keep
/// their observation order.
pub fn bottleneck_lanes(series: &[LaneCongestionSeries], limit: usize) -> Vec<LaneLoad> {
    let mut loads = lane_averages(series);
    loads.sort_by(|a, b| {
        b.avg_vehicles
            .partial_cmp(&a.avg_vehicles)
            .unwrap_or(Ordering::Equal)
    });
    loads.truncate(limit);
    loads
}

pub fn summarize(metrics: &MetricsCollector, baseline: f64) -> TrafficSummary {
    let waits = metrics.wait_times();
    let total_vehicles = waits.len();

    let average_wait = if waits.is_empty() {
        0.0
    } else {
        waits.values().sum::<f64>() / total_vehicles as f64
    };
    let max_wait = waits.values().copied().fold(0.0, f64::max);

    TrafficSummary {
        total_vehicles,
        average_wait,
        max_wait,
        efficiency: efficiency_percentage(average_wait, baseline),
        bottlenecks: bottleneck_lanes(metrics.lane_series(), BOTTLENECK_LANE_COUNT),
    }
}

pub fn log_summary(summary: &TrafficSummary) {
    log::info!("--- Traffic Efficiency Summary ---");
    log::info!("Total Vehicles Processed: {}", summary.total_vehicles);
    log::info!(
        "Average Wait Time per Vehicle: {:.2} seconds",
        summary.average_wait
    );
    log::info!("Maximum Wait Time: {:.2} seconds", summary.max_wait);
    log::info!(
        "Efficiency Compared to Fixed Traffic Lights: {:.2}% time saved",
        summary.efficiency
    );
    for load in &summary.bottlenecks {
        log::info!(
            "Bottleneck lane {}: {:.2} vehicles waiting on average",
            load.lane,
            load.avg_vehicles
        );
    }
}
