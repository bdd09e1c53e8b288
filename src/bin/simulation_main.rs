// simulation_main.rs
use clap::Parser;
use density_traffic_manager::config::{Backend, SimulationArgs};
use density_traffic_manager::simulation_engine::run_simulation;
use density_traffic_manager::simulator::{BridgeClient, SimulatorClient, SyntheticSimulator};
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = SimulationArgs::parse();
    let config = args.simulation_config();
    let summary_path = config.summary_path();

    // The first Ctrl-C only raises the flag; the loop finishes its step,
    // writes the summary and closes the simulator before exiting. A second
    // one exits straight away.
    let stop = Arc::new(AtomicBool::new(false));
    let interrupt_watcher = {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            log::warn!("Interrupt received, stopping after the current step");
            stop.store(true, Ordering::SeqCst);
            if tokio::signal::ctrl_c().await.is_ok() {
                log::error!("Second interrupt received, exiting without a summary");
                std::process::exit(130);
            }
        })
    };

    let outcome = tokio::task::spawn_blocking(move || {
        let mut client: Box<dyn SimulatorClient> = match args.backend {
            Backend::Bridge => Box::new(BridgeClient::connect(&args.bridge_options())?),
            Backend::Synthetic => Box::new(SyntheticSimulator::new(args.synthetic_config())),
        };
        run_simulation(client.as_mut(), &config, &stop)
    })
    .await?;
    interrupt_watcher.abort();

    let outcome = outcome?;
    log::info!(
        "Simulation ended after {} steps ({:?}); {} traffic light errors and {} waiting time reads skipped",
        outcome.steps,
        outcome.stop_reason,
        outcome.light_errors,
        outcome.skipped_waits
    );
    if outcome.reports_written {
        log::info!("All reports saved, summary at {}", summary_path.display());
    }
    Ok(())
}
