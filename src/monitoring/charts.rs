// charts.rs
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

use crate::error::ReportError;
use crate::flow_analyzer::LaneLoad;

pub const HEATMAP_CAPTION: &str = "Final Traffic Congestion Heatmap";

/// Draws one red bar per lane, in the order given.
pub fn draw_lane_bars<DB>(
    root: DrawingArea<DB, Shift>,
    caption: &str,
    loads: &[LaneLoad],
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let slots = loads.len().max(1) as u32;
    let y_max = loads
        .iter()
        .map(|l| l.avg_vehicles)
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(50)
        .build_cartesian_2d((0u32..slots).into_segmented(), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Lane ID")
        .y_desc("Average Number of Waiting Vehicles")
        .x_labels(slots as usize)
        .x_label_formatter(&|x| match x {
            SegmentValue::CenterOf(i) => loads
                .get(*i as usize)
                .map(|l| l.lane.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(RED.filled())
            .margin(10)
            .data(
                loads
                    .iter()
                    .enumerate()
                    .map(|(i, l)| (i as u32, l.avg_vehicles)),
            ),
    )?;

    root.present()?;
    Ok(())
}

/// Renders the end-of-run congestion chart to a PNG.
pub fn write_heatmap(path: &Path, loads: &[LaneLoad]) -> Result<(), ReportError> {
    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    draw_lane_bars(root, HEATMAP_CAPTION, loads).map_err(|e| ReportError::Chart(e.to_string()))
}

/// Renders the same bar chart as an inline SVG document.
pub fn lane_bars_svg(caption: &str, loads: &[LaneLoad]) -> Result<String, ReportError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (640, 360)).into_drawing_area();
        draw_lane_bars(root, caption, loads).map_err(|e| ReportError::Chart(e.to_string()))?;
    }
    Ok(svg)
}
