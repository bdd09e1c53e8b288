// metrics.rs
use std::collections::HashMap;

/// Per-step vehicle counts observed on one lane.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneCongestionSeries {
    pub lane_id: String,
    pub samples: Vec<u32>,
}

impl LaneCongestionSeries {
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.samples.iter().map(|&s| s as u64).sum();
        sum as f64 / self.samples.len() as f64
    }
}

/// Everything the step loop accumulates for the end-of-run summary.
///
/// Wait times are overwritten with the latest reported value rather than
/// summed, so a vehicle's final figure is whatever the simulator said on the
/// last step it was seen. Lane series keep the order lanes were first observed.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    wait_times: HashMap<String, f64>,
    series: Vec<LaneCongestionSeries>,
    lane_index: HashMap<String, usize>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_wait_time(&mut self, vehicle_id: &str, waiting_time: f64) {
        match self.wait_times.get_mut(vehicle_id) {
            Some(existing) => *existing = waiting_time,
            None => {
                self.wait_times.insert(vehicle_id.to_string(), waiting_time);
            }
        }
    }

    pub fn record_lane_count(&mut self, lane_id: &str, vehicle_count: u32) {
        let index = match self.lane_index.get(lane_id) {
            Some(&index) => index,
            None => {
                self.series.push(LaneCongestionSeries {
                    lane_id: lane_id.to_string(),
                    samples: Vec::new(),
                });
                self.lane_index
                    .insert(lane_id.to_string(), self.series.len() - 1);
                self.series.len() - 1
            }
        };
        self.series[index].samples.push(vehicle_count);
    }

    pub fn wait_times(&self) -> &HashMap<String, f64> {
        &self.wait_times
    }

    pub fn lane_series(&self) -> &[LaneCongestionSeries] {
        &self.series
    }

    pub fn vehicles_seen(&self) -> usize {
        self.wait_times.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_time_keeps_latest_value_not_sum() {
        let mut metrics = MetricsCollector::new();
        metrics.record_wait_time("v1", 5.0);
        metrics.record_wait_time("v1", 3.0);
        metrics.record_wait_time("v2", 1.0);

        assert_eq!(metrics.vehicles_seen(), 2);
        assert_eq!(metrics.wait_times()["v1"], 3.0);
    }

    #[test]
    fn lane_series_keep_first_seen_order() {
        let mut metrics = MetricsCollector::new();
        metrics.record_lane_count("b", 1);
        metrics.record_lane_count("a", 2);
        metrics.record_lane_count("b", 3);

        let lanes: Vec<&str> = metrics
            .lane_series()
            .iter()
            .map(|s| s.lane_id.as_str())
            .collect();
        assert_eq!(lanes, vec!["b", "a"]);
        assert_eq!(metrics.lane_series()[0].samples, vec![1, 3]);
        assert_eq!(metrics.lane_series()[0].average(), 2.0);
    }
}
