//! Blocking execution of one simulation with cooperative cancellation.

use antsort_core::{Result, SimulationConfig};
use antsort_world::{Simulation, SimulationResult, StepObserver, StepView};
use std::ops::ControlFlow;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Stops the simulation at the next tick boundary once the token is cancelled.
pub struct CancelOnToken {
    token: CancellationToken,
}

impl CancelOnToken {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl StepObserver for CancelOnToken {
    fn on_step(&mut self, view: StepView<'_>) -> ControlFlow<()> {
        if self.token.is_cancelled() {
            info!(tick = view.tick, quality = view.quality, "Cancellation requested");
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

/// Build and run a simulation to completion or cancellation
#[instrument(skip_all, fields(seed = config.seed))]
pub fn execute(config: SimulationConfig, token: CancellationToken) -> Result<SimulationResult> {
    let mut simulation = Simulation::new(config)?;
    info!(
        run_id = %simulation.run_id(),
        objects = simulation.grid().occupied_count(),
        initial_quality = simulation.final_quality(),
        "Simulation created"
    );

    let mut observer = CancelOnToken::new(token);
    simulation.run_with_observer(&mut observer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            height: 8,
            width: 8,
            num_ants: 5,
            num_steps: 300,
            seed: 21,
            ..Default::default()
        }
    }

    #[test]
    fn test_execute_runs_to_completion() {
        let result = execute(small_config(), CancellationToken::new()).unwrap();
        assert!(result.completed);
        assert_eq!(result.total_ticks, 300);
    }

    #[test]
    fn test_cancelled_token_stops_after_first_tick() {
        let token = CancellationToken::new();
        token.cancel();
        let result = execute(small_config(), token).unwrap();
        assert!(!result.completed);
        assert_eq!(result.total_ticks, 1);
        assert_eq!(result.samples.len(), 1);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let config = SimulationConfig {
            num_colors: 0,
            ..small_config()
        };
        assert!(execute(config, CancellationToken::new()).is_err());
    }
}
