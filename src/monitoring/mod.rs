pub mod charts;
pub mod report_writer;
pub mod summary_reader;

pub use charts::{lane_bars_svg, write_heatmap};
pub use report_writer::{write_summary, ensure_results_folder};
pub use summary_reader::{parse_summary, read_summary, SummaryTable};
