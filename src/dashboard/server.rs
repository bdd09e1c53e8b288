// server.rs
//
// Read-only dashboard over the summary artifact. Nothing is cached between
// requests: every call re-reads the files the simulation run left behind.

use std::io::ErrorKind;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::view::DashboardView;
use crate::config::DashboardConfig;
use crate::monitoring::{lane_bars_svg, parse_summary};

#[derive(Clone)]
pub struct DashboardState {
    config: Arc<DashboardConfig>,
}

impl DashboardState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardPayload {
    #[serde(flatten)]
    pub view: DashboardView,
    /// Bar chart of the bottleneck lanes; empty when there is nothing to plot.
    pub chart_svg: String,
}

pub async fn load_view(config: &DashboardConfig) -> DashboardView {
    let result = match tokio::fs::read(&config.summary_path).await {
        Ok(bytes) => parse_summary(&bytes).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    };
    DashboardView::from_read(result)
}

fn chart_svg(view: &DashboardView) -> String {
    if view.chart.is_empty() {
        return String::new();
    }
    match lane_bars_svg(&view.chart.title, &view.chart.bars) {
        Ok(svg) => svg,
        Err(e) => {
            log::warn!("Could not render congestion chart: {}", e);
            String::new()
        }
    }
}

pub async fn dashboard_data(State(state): State<DashboardState>) -> Json<DashboardPayload> {
    let view = load_view(&state.config).await;
    let chart_svg = chart_svg(&view);
    Json(DashboardPayload { view, chart_svg })
}

pub async fn heatmap(State(state): State<DashboardState>) -> Response {
    match tokio::fs::read(&state.config.heatmap_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) => {
            log::debug!(
                "Heatmap {} not available: {}",
                state.config.heatmap_path.display(),
                e
            );
            (StatusCode::NOT_FOUND, "Heatmap not generated yet").into_response()
        }
    }
}

pub async fn index(State(state): State<DashboardState>) -> Html<String> {
    Html(render_page(
        &state.config.title,
        state.config.poll_interval.as_millis() as u64,
    ))
}

pub fn router(config: DashboardConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/dashboard", get(dashboard_data))
        .route("/congestion_heatmap.png", get(heatmap))
        .with_state(DashboardState::new(config))
}

pub async fn serve(config: DashboardConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    log::info!(
        "Dashboard listening on http://{} (summary: {})",
        listener.local_addr()?,
        config.summary_path.display()
    );
    axum::serve(listener, router(config)).await
}

fn render_page(title: &str, poll_ms: u64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; padding: 20px; }}
.card {{ width: 30%; display: inline-block; text-align: center; vertical-align: top; }}
#efficiency-output {{ font-size: 30px; color: green; }}
#wait-time-output {{ font-size: 30px; color: blue; }}
#congestion-message {{ font-size: 20px; color: red; }}
table {{ width: 50%; border-collapse: collapse; }}
td, th {{ text-align: center; border: 1px solid #ccc; padding: 4px; }}
</style>
</head>
<body>
<h1 style="text-align:center">Real-Time {title}</h1>
<div class="card"><h3>Traffic Efficiency (%)</h3><div id="efficiency-output"></div></div>
<div class="card"><h3>Avg Vehicle Wait Time (seconds)</h3><div id="wait-time-output"></div></div>
<div class="card"><h3>Congestion Status</h3><div id="congestion-message"></div></div>
<hr>
<h3>Bottleneck Lanes</h3>
<table>
<thead><tr><th>Lane ID</th><th>Avg Vehicles Waiting</th></tr></thead>
<tbody id="bottleneck-table"></tbody>
</table>
<hr>
<h3>Traffic Congestion Overview</h3>
<div id="congestion-chart"></div>
<hr>
<h3>Final Congestion Heatmap</h3>
<img src="/congestion_heatmap.png" style="width:60%" alt="No heatmap yet">
<script>
function cell(text) {{
  const td = document.createElement("td");
  td.textContent = text;
  return td;
}}
async function refresh() {{
  try {{
    const d = await (await fetch("/api/dashboard")).json();
    document.getElementById("efficiency-output").textContent = d.efficiency;
    document.getElementById("wait-time-output").textContent = d.wait_time;
    document.getElementById("congestion-message").textContent = d.congestion_status;
    const body = document.getElementById("bottleneck-table");
    body.replaceChildren(...d.bottlenecks.map(function (row) {{
      const tr = document.createElement("tr");
      tr.append(cell(row.lane), cell(row.avg_vehicles));
      return tr;
    }}));
    document.getElementById("congestion-chart").innerHTML = d.chart_svg;
  }} catch (e) {{
    console.log("dashboard refresh failed", e);
  }}
}}
refresh();
setInterval(refresh, {poll_ms});
</script>
</body>
</html>
"#,
        title = title,
        poll_ms = poll_ms
    )
}
