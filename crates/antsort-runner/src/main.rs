//! Headless runner for a single ant-clustering simulation.

mod telemetry;
mod runner;

use anyhow::{Context, Result};
use antsort_core::SimulationConfig;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let config = load_config()?;
    info!(
        height = config.height,
        width = config.width,
        num_colors = config.num_colors,
        fill_fraction = config.fill_fraction,
        num_ants = config.num_ants,
        num_steps = config.num_steps,
        seed = config.seed,
        "Starting antsort runner"
    );

    let token = CancellationToken::new();
    let run_token = token.clone();
    let mut handle = tokio::task::spawn_blocking(move || runner::execute(config, run_token));

    let result = tokio::select! {
        joined = &mut handle => joined??,
        _ = shutdown_signal() => {
            token.cancel();
            handle.await??
        }
    };

    info!(
        initial_quality = result.initial_quality,
        final_quality = result.final_quality,
        improvement = result.improvement(),
        "Run finished"
    );
    println!("{}", result.to_json()?);

    Ok(())
}

/// Default configuration, with the seed taken from `ANTSORT_SEED` when set
fn load_config() -> Result<SimulationConfig> {
    let mut config = SimulationConfig::default();
    if let Ok(seed) = std::env::var("ANTSORT_SEED") {
        config.seed = seed
            .parse()
            .with_context(|| format!("ANTSORT_SEED must be an unsigned integer, got {:?}", seed))?;
    }
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
