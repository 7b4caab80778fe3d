//! Ant-clustering simulation engine.
//!
//! Ants wander a bounded 2D grid of colored objects, picking up objects that
//! sit among dissimilar neighbors and dropping them next to similar ones.
//! Same-colored objects gradually gather into clusters.

pub mod grid;
pub mod ant;
pub mod observer;
pub mod simulation;

pub use grid::GridWorld;
pub use ant::{Ant, AntSnapshot, AntStats, StepOutcome};
pub use observer::{StepObserver, StepView};
pub use simulation::{QualitySample, Simulation, SimulationResult, SimulationState};
