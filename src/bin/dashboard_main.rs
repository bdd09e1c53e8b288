// dashboard_main.rs
use clap::Parser;
use density_traffic_manager::config::DashboardArgs;
use density_traffic_manager::dashboard::serve;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = DashboardArgs::parse();
    if let Err(e) = serve(args.dashboard_config()).await {
        log::error!("Dashboard server error: {}", e);
        return Err(e.into());
    }
    Ok(())
}
