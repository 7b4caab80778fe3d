//! Per-tick observation hook for renderers and progress reporting.

use crate::ant::Ant;
use crate::grid::GridWorld;
use std::ops::ControlFlow;

/// Read-only state handed to an observer after every completed tick
#[derive(Debug, Clone, Copy)]
pub struct StepView<'a> {
    /// Ticks completed so far, starting at 1
    pub tick: u64,
    pub grid: &'a GridWorld,
    /// Quality of the grid as it stands after this tick
    pub quality: f64,
    pub ants: &'a [Ant],
}

/// Called once per tick. Returning `ControlFlow::Break` ends the run after
/// the current tick; on the final tick the run still counts as completed.
pub trait StepObserver {
    fn on_step(&mut self, view: StepView<'_>) -> ControlFlow<()>;
}

impl<F> StepObserver for F
where
    F: FnMut(StepView<'_>) -> ControlFlow<()>,
{
    fn on_step(&mut self, view: StepView<'_>) -> ControlFlow<()> {
        self(view)
    }
}
