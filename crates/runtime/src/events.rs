use std::time::Duration;

use core_sim::{InvalidObservation, StepOutOfOrder, Symbol};

use crate::metrics::TickLatencyReport;

/// What one `advance` call did to each instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub step: u64,
    pub applied: Vec<(Symbol, f64)>,
    pub skipped: Vec<(Symbol, InvalidObservation)>,
    /// Draw, commit and publish time for this tick.
    pub elapsed: Duration,
}

impl TickReport {
    pub fn new(step: u64) -> Self {
        Self {
            step,
            applied: Vec::new(),
            skipped: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn instruments(&self) -> usize {
        self.applied.len() + self.skipped.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    HorizonReached { steps: u64 },
    Stopped { last_step: u64 },
    /// The clock handed out a step the market had already applied.
    Aborted { last_step: u64, error: StepOutOfOrder },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub latency: Option<TickLatencyReport>,
}
