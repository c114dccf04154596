//! Fixed-length simulation runs.
//!
//! [`run`] steps a model a given number of ticks and reports every
//! completed tick to a [`TickObserver`]. It stops at the first error, which
//! is returned unchanged; ticks that completed before it stay applied.

use habitat_types::Agent;
use habitat_world::World;
use tracing::info;

use crate::error::ModelError;
use crate::model::Model;

/// What an observer learns about one completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The model time after the tick.
    pub tick: u64,
    /// Number of agents after the tick.
    pub agents: usize,
}

/// Result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of ticks executed by this run.
    pub ticks_run: u64,
    /// The model time when the run ended.
    pub final_time: u64,
    /// Number of agents when the run ended.
    pub agents: usize,
}

/// Callback invoked after each tick completes.
pub trait TickObserver<A, W> {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, model: &Model<A, W>);
}

/// An observer that ignores every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl<A, W> TickObserver<A, W> for NoOpObserver {
    fn on_tick(&mut self, _summary: &TickSummary, _model: &Model<A, W>) {}
}

/// An observer that logs a progress line every `every` ticks.
#[derive(Debug, Clone, Copy)]
pub struct LoggingObserver {
    every: u64,
}

impl LoggingObserver {
    /// Log every `every` ticks. Zero disables logging.
    pub const fn new(every: u64) -> Self {
        Self { every }
    }
}

impl<A, W: World> TickObserver<A, W> for LoggingObserver {
    fn on_tick(&mut self, summary: &TickSummary, model: &Model<A, W>) {
        if summary.tick.checked_rem(self.every) == Some(0) {
            info!(
                model = %model.id(),
                tick = summary.tick,
                agents = summary.agents,
                "{model}"
            );
        }
    }
}

/// Step `model` `ticks` times, notifying `observer` after each tick.
///
/// # Errors
///
/// Returns the first [`ModelError`] raised by [`Model::step`].
pub fn run<A, W>(
    model: &mut Model<A, W>,
    ticks: u64,
    observer: &mut dyn TickObserver<A, W>,
) -> Result<RunSummary, ModelError>
where
    A: Agent,
    W: World,
{
    info!(model = %model.id(), start = model.time(), ticks, "Run starting");

    let mut ticks_run: u64 = 0;
    while ticks_run < ticks {
        let tick = model.step()?;
        ticks_run = ticks_run.saturating_add(1);
        observer.on_tick(
            &TickSummary {
                tick,
                agents: model.len(),
            },
            model,
        );
    }

    let summary = RunSummary {
        ticks_run,
        final_time: model.time(),
        agents: model.len(),
    };
    info!(
        model = %model.id(),
        ticks_run = summary.ticks_run,
        final_time = summary.final_time,
        agents = summary.agents,
        "Run finished"
    );
    Ok(summary)
}
