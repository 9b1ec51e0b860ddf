use std::time::Duration;

pub const MONTHS_PER_YEAR: u64 = 12;
pub const DEFAULT_YEARS: u64 = 20;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Each step is one simulated month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    pub tick_interval: Duration,
    pub total_steps: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            total_steps: DEFAULT_YEARS * MONTHS_PER_YEAR,
        }
    }
}

/// Calendar year a step falls in, counted from 1 as `step / 12 + 1`.
pub fn year_of_step(step: u64) -> u64 {
    step / MONTHS_PER_YEAR + 1
}
