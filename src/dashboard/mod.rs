pub mod server;
pub mod view;

pub use server::{router, serve, DashboardState};
pub use view::{BarChart, BottleneckRow, DashboardView};
