// view.rs
use serde::Serialize;

use crate::error::DashboardError;
use crate::flow_analyzer::LaneLoad;
use crate::monitoring::report_writer::{AVERAGE_WAIT, CONGESTION_STATUS, EFFICIENCY};
use crate::monitoring::SummaryTable;

pub const WAITING_FOR_DATA: &str = "Waiting for data...";
pub const NO_DATA_YET: &str = "No data yet";
pub const NOT_AVAILABLE: &str = "N/A";
pub const CHART_TITLE: &str = "Traffic Congestion per Lane";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BottleneckRow {
    pub lane: String,
    pub avg_vehicles: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<LaneLoad>,
}

impl BarChart {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// What the dashboard page shows, rebuilt from the artifact on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub efficiency: String,
    pub wait_time: String,
    pub congestion_status: String,
    pub bottlenecks: Vec<BottleneckRow>,
    pub chart: BarChart,
}

impl DashboardView {
    pub fn placeholder() -> Self {
        Self {
            efficiency: WAITING_FOR_DATA.to_string(),
            wait_time: WAITING_FOR_DATA.to_string(),
            congestion_status: NO_DATA_YET.to_string(),
            bottlenecks: Vec::new(),
            chart: BarChart::default(),
        }
    }

    pub fn from_table(table: &SummaryTable) -> Self {
        let bottlenecks: Vec<BottleneckRow> = table
            .bottlenecks
            .iter()
            .map(|(lane, avg)| BottleneckRow {
                lane: lane.clone(),
                avg_vehicles: avg.clone(),
            })
            .collect();

        let bars = table
            .bottlenecks
            .iter()
            .filter_map(|(lane, avg)| {
                avg.trim().parse::<f64>().ok().map(|avg_vehicles| LaneLoad {
                    lane: lane.clone(),
                    avg_vehicles,
                })
            })
            .collect();

        Self {
            efficiency: table
                .metric(EFFICIENCY)
                .map(|v| format!("{}%", v))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            wait_time: table
                .metric(AVERAGE_WAIT)
                .map(|v| format!("{} sec", v))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            congestion_status: congestion_status(table),
            bottlenecks,
            chart: BarChart {
                title: CHART_TITLE.to_string(),
                bars,
            },
        }
    }

    /// Maps the outcome of reading the artifact onto a view. A missing or
    /// unreadable artifact shows the placeholder.
    pub fn from_read(result: Result<Option<SummaryTable>, DashboardError>) -> Self {
        match result {
            Ok(Some(table)) => Self::from_table(&table),
            Ok(None) => Self::placeholder(),
            Err(e) => {
                // Most likely read mid-write; the next refresh picks it up.
                log::warn!("Could not load traffic summary: {}", e);
                Self::placeholder()
            }
        }
    }
}

fn congestion_status(table: &SummaryTable) -> String {
    if let Some(status) = table.metric(CONGESTION_STATUS) {
        return status.to_string();
    }
    match table.bottlenecks.first() {
        Some((lane, avg)) => format!("Most congested: {} ({} vehicles waiting)", lane, avg),
        None => "No congestion recorded".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::parse_summary;

    fn table(text: &str) -> SummaryTable {
        parse_summary(text.as_bytes()).unwrap()
    }

    #[test]
    fn missing_artifact_shows_placeholder() {
        let view = DashboardView::from_read(Ok(None));
        assert_eq!(view.efficiency, "Waiting for data...");
        assert_eq!(view.wait_time, "Waiting for data...");
        assert_eq!(view.congestion_status, "No data yet");
        assert!(view.bottlenecks.is_empty());
        assert!(view.chart.is_empty());
        assert_eq!(view, DashboardView::placeholder());
    }

    #[test]
    fn unreadable_artifact_shows_placeholder() {
        let view = DashboardView::from_read(Err(DashboardError::MissingHeader));
        assert_eq!(view, DashboardView::placeholder());
    }

    #[test]
    fn projects_metrics_and_bottlenecks() {
        let view = DashboardView::from_table(&table(
            "Metric,Value\r\n\
             Total Vehicles Processed,3\r\n\
             Average Wait Time (seconds),20.0\r\n\
             Maximum Wait Time (seconds),30.0\r\n\
             Efficiency (%),50.0\r\n\
             \r\n\
             Bottleneck Lanes,Avg Vehicles Waiting\r\n\
             C,5.0\r\n\
             A,3.0\r\n",
        ));

        assert_eq!(view.efficiency, "50.0%");
        assert_eq!(view.wait_time, "20.0 sec");
        assert_eq!(view.congestion_status, "Most congested: C (5.0 vehicles waiting)");
        assert_eq!(
            view.bottlenecks,
            vec![
                BottleneckRow { lane: "C".into(), avg_vehicles: "5.0".into() },
                BottleneckRow { lane: "A".into(), avg_vehicles: "3.0".into() },
            ]
        );
        assert_eq!(view.chart.title, CHART_TITLE);
        assert_eq!(view.chart.bars.len(), 2);
        assert_eq!(view.chart.bars[1].avg_vehicles, 3.0);
    }

    #[test]
    fn explicit_congestion_status_row_wins() {
        let view = DashboardView::from_table(&table(
            "Metric,Value\nCongestion Status,Heavy on ring road\nEfficiency (%),10.0\n",
        ));
        assert_eq!(view.congestion_status, "Heavy on ring road");
        assert_eq!(view.wait_time, "N/A");
    }

    #[test]
    fn empty_bottleneck_table() {
        let view = DashboardView::from_table(&table(
            "Metric,Value\nEfficiency (%),100.0\n\nBottleneck Lanes,Avg Vehicles Waiting\n",
        ));
        assert_eq!(view.congestion_status, "No congestion recorded");
        assert!(view.chart.is_empty());
    }
}
