// report_writer.rs
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::flow_analyzer::TrafficSummary;

pub const METRIC_HEADER: [&str; 2] = ["Metric", "Value"];
pub const TOTAL_VEHICLES: &str = "Total Vehicles Processed";
pub const AVERAGE_WAIT: &str = "Average Wait Time (seconds)";
pub const MAXIMUM_WAIT: &str = "Maximum Wait Time (seconds)";
pub const EFFICIENCY: &str = "Efficiency (%)";
pub const CONGESTION_STATUS: &str = "Congestion Status";
pub const BOTTLENECK_HEADER: [&str; 2] = ["Bottleneck Lanes", "Avg Vehicles Waiting"];

/// Rounds to two decimals and prints with at least one fractional digit
/// ("20.0", "33.33").
pub fn format_value(value: f64) -> String {
    format!("{:?}", (value * 100.0).round() / 100.0)
}

fn into_bytes(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ReportError> {
    wtr.into_inner().map_err(|e| {
        ReportError::Io(io::Error::new(e.error().kind(), e.error().to_string()))
    })
}

fn writer(buf: Vec<u8>) -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(buf)
}

/// Builds the two-part summary table: scalar metrics, a blank row, then the
/// bottleneck lanes.
pub fn summary_csv(summary: &TrafficSummary) -> Result<Vec<u8>, ReportError> {
    let mut wtr = writer(Vec::new());
    wtr.write_record(METRIC_HEADER)?;
    wtr.write_record([TOTAL_VEHICLES, summary.total_vehicles.to_string().as_str()])?;
    wtr.write_record([AVERAGE_WAIT, format_value(summary.average_wait).as_str()])?;
    wtr.write_record([MAXIMUM_WAIT, format_value(summary.max_wait).as_str()])?;
    wtr.write_record([EFFICIENCY, format_value(summary.efficiency).as_str()])?;

    // The csv writer quotes empty records, so the separator goes in by hand.
    let mut buf = into_bytes(wtr)?;
    buf.extend_from_slice(b"\r\n");

    let mut wtr = writer(buf);
    wtr.write_record(BOTTLENECK_HEADER)?;
    for load in &summary.bottlenecks {
        wtr.write_record([load.lane.as_str(), format_value(load.avg_vehicles).as_str()])?;
    }
    into_bytes(wtr)
}

pub fn ensure_results_folder(folder: &Path) -> Result<(), ReportError> {
    fs::create_dir_all(folder).map_err(|source| ReportError::CreateDir {
        path: folder.to_path_buf(),
        source,
    })
}

/// Writes the summary table, creating the parent folder if needed.
pub fn write_summary(path: &Path, summary: &TrafficSummary) -> Result<PathBuf, ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_results_folder(parent)?;
    }
    let bytes = summary_csv(summary)?;
    fs::write(path, bytes)?;
    log::info!("Traffic summary saved at: {}", path.display());
    Ok(path.to_path_buf())
}
