//! Simulation engine: steps every ant once per tick and tracks clustering quality.

use crate::ant::{Ant, AntSnapshot};
use crate::grid::GridWorld;
use crate::observer::{StepObserver, StepView};
use antsort_core::{Error, Position, QualityMetric, Result, RunId, SimulationConfig};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Lifecycle of a simulation. `run` is only accepted in `Initialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationState {
    Initialized,
    Running,
    Completed,
    /// Stopped early by an observer
    Interrupted,
}

/// Quality of the grid after `tick` ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySample {
    pub tick: u64,
    pub quality: f64,
}

pub struct Simulation {
    run_id: RunId,
    config: SimulationConfig,
    grid: GridWorld,
    ants: Vec<Ant>,
    rng: ChaCha8Rng,
    tick: u64,
    state: SimulationState,
    quality_history: Vec<QualitySample>,
    initial_objects: usize,
}

impl Simulation {
    /// Build the grid and place `num_ants` ants at random cells.
    ///
    /// The grid layout and the ant positions both come from one rng seeded
    /// with `config.seed`, in that order.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = GridWorld::from_config(&config, &mut rng)?;
        let ants = (0..config.num_ants)
            .map(|_| Ant::random(&grid, config.k1, config.k2, &mut rng))
            .collect();

        Ok(Self::assemble(config, grid, ants, rng))
    }

    /// Like [`Simulation::new`] but with ants at the given positions.
    /// `config.num_ants` is replaced by the number of positions.
    pub fn with_ants(mut config: SimulationConfig, positions: &[Position]) -> Result<Self> {
        config.num_ants = u32::try_from(positions.len())
            .map_err(|_| Error::InvalidConfig("too many ants".to_string()))?;
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = GridWorld::from_config(&config, &mut rng)?;

        if let Some(pos) = positions.iter().find(|p| !grid.is_valid(p.row, p.col)) {
            return Err(Error::InvalidConfig(format!(
                "ant position {} is outside the {}x{} grid",
                pos,
                grid.height(),
                grid.width()
            )));
        }

        let ants = positions
            .iter()
            .map(|&pos| Ant::new(pos, config.k1, config.k2))
            .collect();

        Ok(Self::assemble(config, grid, ants, rng))
    }

    fn assemble(config: SimulationConfig, grid: GridWorld, ants: Vec<Ant>, rng: ChaCha8Rng) -> Self {
        let initial_quality = config.metric.score(&grid);
        let initial_objects = grid.occupied_count();

        let sim = Self {
            run_id: RunId::new(),
            config,
            grid,
            ants,
            rng,
            tick: 0,
            state: SimulationState::Initialized,
            quality_history: vec![QualitySample {
                tick: 0,
                quality: initial_quality,
            }],
            initial_objects,
        };

        debug!(
            run_id = %sim.run_id,
            height = sim.grid.height(),
            width = sim.grid.width(),
            objects = initial_objects,
            ants = sim.ants.len(),
            initial_quality,
            "Simulation initialized"
        );

        sim
    }

    /// Run all configured ticks
    pub fn run(&mut self) -> Result<SimulationResult> {
        self.drive(None)
    }

    /// Run all configured ticks, calling `observer` after each one
    pub fn run_with_observer(&mut self, observer: &mut dyn StepObserver) -> Result<SimulationResult> {
        self.drive(Some(observer))
    }

    #[instrument(skip(self, observer), fields(run_id = %self.run_id, num_steps = self.config.num_steps))]
    fn drive(&mut self, mut observer: Option<&mut dyn StepObserver>) -> Result<SimulationResult> {
        if self.state != SimulationState::Initialized {
            return Err(Error::InvalidState(format!(
                "simulation {} has already run (state {:?})",
                self.run_id, self.state
            )));
        }

        self.state = SimulationState::Running;
        let started_at = Utc::now();
        let num_steps = self.config.num_steps;
        info!("Starting simulation for {} ticks", num_steps);

        while self.tick < num_steps {
            self.step();
            let tick = self.tick;

            let sampled = if tick % self.config.track_interval == 0 || tick == num_steps {
                Some(self.record_quality())
            } else {
                None
            };

            if let Some(observer) = observer.as_deref_mut() {
                let quality = sampled.unwrap_or_else(|| self.current_quality());
                let view = StepView {
                    tick,
                    grid: &self.grid,
                    quality,
                    ants: &self.ants,
                };
                if observer.on_step(view).is_break() && tick < num_steps {
                    info!(tick, "Simulation interrupted by observer");
                    self.state = SimulationState::Interrupted;
                    break;
                }
            }

            if tick % PROGRESS_LOG_INTERVAL == 0 {
                info!(
                    "Tick {}/{}: quality {:.4}",
                    tick,
                    num_steps,
                    self.final_quality()
                );
            }
        }

        if self.state == SimulationState::Running {
            self.state = SimulationState::Completed;
        }

        let result = self.collect_results(started_at);
        self.emit_run_summary(&result);
        Ok(result)
    }

    /// Advance every ant once, in creation order
    fn step(&mut self) {
        for ant in &mut self.ants {
            ant.step(&mut self.grid, &mut self.rng);
        }
        self.tick += 1;
    }

    fn record_quality(&mut self) -> f64 {
        let quality = self.current_quality();
        self.quality_history.push(QualitySample {
            tick: self.tick,
            quality,
        });
        debug!(tick = self.tick, quality, "Quality sample");
        quality
    }

    /// Score the grid as it stands now with the configured metric
    pub fn current_quality(&self) -> f64 {
        self.config.metric.score(&self.grid)
    }

    /// Last recorded quality sample
    pub fn final_quality(&self) -> f64 {
        self.quality_history.last().map_or(0.0, |s| s.quality)
    }

    /// Copy of the recorded quality values, oldest first
    pub fn quality_history(&self) -> Vec<f64> {
        self.quality_history.iter().map(|s| s.quality).collect()
    }

    pub fn quality_samples(&self) -> &[QualitySample] {
        &self.quality_history
    }

    pub fn grid(&self) -> &GridWorld {
        &self.grid
    }

    pub fn ants(&self) -> &[Ant] {
        &self.ants
    }

    pub fn ant_snapshots(&self) -> Vec<AntSnapshot> {
        self.ants.iter().map(AntSnapshot::from).collect()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn collect_results(&self, started_at: DateTime<Utc>) -> SimulationResult {
        let objects_carried = self.ants.iter().filter(|a| a.is_carrying()).count();
        let (total_picks, total_drops) = self
            .ants
            .iter()
            .fold((0, 0), |(p, d), a| (p + a.stats().picks, d + a.stats().drops));

        SimulationResult {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            metric: self.config.metric,
            total_ticks: self.tick,
            completed: self.state == SimulationState::Completed,
            initial_quality: self.quality_history.first().map_or(0.0, |s| s.quality),
            final_quality: self.final_quality(),
            samples: self.quality_history.clone(),
            initial_objects: self.initial_objects,
            objects_on_grid: self.grid.occupied_count(),
            objects_carried,
            total_picks,
            total_drops,
        }
    }

    fn emit_run_summary(&self, result: &SimulationResult) {
        info!(
            event = "run_summary",
            run_id = %result.run_id,
            completed = result.completed,
            total_ticks = result.total_ticks,
            initial_quality = result.initial_quality,
            final_quality = result.final_quality,
            improvement = result.improvement(),
            objects_on_grid = result.objects_on_grid,
            objects_carried = result.objects_carried,
            total_picks = result.total_picks,
            total_drops = result.total_drops,
            elapsed_ms = (result.finished_at - result.started_at).num_milliseconds(),
            "🏁 Run complete"
        );
    }
}

/// Summary of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub metric: QualityMetric,
    /// Ticks actually executed
    pub total_ticks: u64,
    /// False when an observer stopped the run early
    pub completed: bool,
    pub initial_quality: f64,
    pub final_quality: f64,
    pub samples: Vec<QualitySample>,
    pub initial_objects: usize,
    pub objects_on_grid: usize,
    pub objects_carried: usize,
    pub total_picks: u64,
    pub total_drops: u64,
}

impl SimulationResult {
    pub fn improvement(&self) -> f64 {
        self.final_quality - self.initial_quality
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
