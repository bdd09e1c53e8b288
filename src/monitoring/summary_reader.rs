// summary_reader.rs
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::report_writer::{BOTTLENECK_HEADER, METRIC_HEADER};
use crate::error::DashboardError;

/// The summary artifact as text, row for row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTable {
    pub metrics: Vec<(String, String)>,
    pub bottlenecks: Vec<(String, String)>,
}

impl SummaryTable {
    pub fn metric(&self, name: &str) -> Option<&str> {
        self.metrics
            .iter()
            .find(|(metric, _)| metric == name)
            .map(|(_, value)| value.as_str())
    }
}

pub fn parse_summary(data: &[u8]) -> Result<SummaryTable, DashboardError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut records = rdr.records();
    match records.next() {
        Some(header) => {
            let header = header?;
            if header.get(0) != Some(METRIC_HEADER[0]) || header.get(1) != Some(METRIC_HEADER[1]) {
                return Err(DashboardError::MissingHeader);
            }
        }
        None => return Err(DashboardError::MissingHeader),
    }

    let mut table = SummaryTable::default();
    let mut in_bottlenecks = false;
    for record in records {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let key = record.get(0).unwrap_or_default().to_string();
        let value = record.get(1).unwrap_or_default().to_string();
        if key == BOTTLENECK_HEADER[0] {
            in_bottlenecks = true;
            continue;
        }
        if in_bottlenecks {
            table.bottlenecks.push((key, value));
        } else {
            table.metrics.push((key, value));
        }
    }
    Ok(table)
}

/// Reads the artifact fresh from disk. `Ok(None)` means it has not been
/// written yet.
pub fn read_summary(path: &Path) -> Result<Option<SummaryTable>, DashboardError> {
    match fs::read(path) {
        Ok(bytes) => parse_summary(&bytes).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_analyzer::{LaneLoad, TrafficSummary};
    use crate::monitoring::report_writer::{summary_csv, write_summary, EFFICIENCY};

    #[test]
    fn reads_back_what_the_reporter_writes() {
        let summary = TrafficSummary {
            total_vehicles: 12,
            average_wait: 7.5,
            max_wait: 19.0,
            efficiency: 81.25,
            bottlenecks: vec![
                LaneLoad { lane: "e1_0".into(), avg_vehicles: 2.5 },
                LaneLoad { lane: "e2_0".into(), avg_vehicles: 1.0 },
            ],
        };
        let table = parse_summary(&summary_csv(&summary).unwrap()).unwrap();

        assert_eq!(table.metric("Total Vehicles Processed"), Some("12"));
        assert_eq!(table.metric(EFFICIENCY), Some("81.25"));
        assert_eq!(
            table.bottlenecks,
            vec![
                ("e1_0".to_string(), "2.5".to_string()),
                ("e2_0".to_string(), "1.0".to_string()),
            ]
        );
    }

    #[test]
    fn accepts_lf_and_no_bottleneck_rows() {
        let text = "Metric,Value\nEfficiency (%),12.0\n\nBottleneck Lanes,Avg Vehicles Waiting\n";
        let table = parse_summary(text.as_bytes()).unwrap();
        assert_eq!(table.metrics.len(), 1);
        assert!(table.bottlenecks.is_empty());
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(matches!(parse_summary(b""), Err(DashboardError::MissingHeader)));
        assert!(matches!(
            parse_summary(b"Lane,Count\n"),
            Err(DashboardError::MissingHeader)
        ));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_summary(&dir.path().join("none.csv")).unwrap(), None);
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traffic_summary.csv");
        let summary = TrafficSummary {
            total_vehicles: 0,
            average_wait: 0.0,
            max_wait: 0.0,
            efficiency: 100.0,
            bottlenecks: vec![],
        };
        write_summary(&path, &summary).unwrap();

        let table = read_summary(&path).unwrap().unwrap();
        assert_eq!(table.metric(EFFICIENCY), Some("100.0"));
    }
}
