//! E-Learning Workload Simulator
//!
//! Simulates populations of admins, instructors and students performing
//! randomized activity against an e-learning backend API.

use anyhow::Result;
use elearn_simulator::population::{monitor, PopulationManager};
use elearn_simulator::session::SessionOrchestrator;
use elearn_simulator::utils::config::{SimConfig, SimMode};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        "Starting E-Learning Workload Simulator v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = SimConfig::load();
    let mode = config.mode;

    let mut manager = PopulationManager::new(config.clone());
    let actors = manager.build_actors();
    let ready = manager.setup(actors).await?;

    match mode {
        SimMode::Free => {
            manager.spawn(ready);

            let summary = tokio::spawn(monitor::run(
                manager.handles().to_vec(),
                config.summary_interval(),
            ));

            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");
            info!("Received interrupt, stopping simulation...");

            manager.stop().await;
            summary.abort();
        }
        SimMode::Session => {
            let shutdown = CancellationToken::new();
            let mut orchestrator =
                SessionOrchestrator::new(ready, manager.library(), &config, shutdown.clone());

            let signal = tokio::spawn(async move {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                info!("Received interrupt, finishing the current session step...");
                shutdown.cancel();
            });

            orchestrator.run().await;
            signal.abort();
        }
    }

    info!("Simulator exited cleanly");
    Ok(())
}
