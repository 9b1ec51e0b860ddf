use std::time::Duration;

/// Wall time spent inside one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTiming {
    pub step: u64,
    pub instruments: usize,
    pub elapsed: Duration,
}

/// Distribution of tick processing times over a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickLatencyReport {
    pub ticks: usize,
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
    pub slowest: TickTiming,
    /// Mean processing time per instrument update across all ticks.
    pub per_instrument: Duration,
}

#[derive(Debug, Default, Clone)]
pub struct TickLatencyMetrics {
    timings: Vec<TickTiming>,
}

impl TickLatencyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, timing: TickTiming) {
        self.timings.push(timing);
    }

    pub fn timings(&self) -> &[TickTiming] {
        &self.timings
    }

    pub fn report(&self) -> Option<TickLatencyReport> {
        let slowest = *self.timings.iter().max_by_key(|timing| timing.elapsed)?;

        let mut elapsed: Vec<Duration> = self.timings.iter().map(|timing| timing.elapsed).collect();
        elapsed.sort_unstable();

        let total: Duration = elapsed.iter().sum();
        let updates: usize = self.timings.iter().map(|timing| timing.instruments).sum();
        let per_instrument = u32::try_from(updates)
            .ok()
            .filter(|updates| *updates > 0)
            .map_or(Duration::ZERO, |updates| total / updates);

        Some(TickLatencyReport {
            ticks: elapsed.len(),
            p50: nearest_rank(&elapsed, 50),
            p90: nearest_rank(&elapsed, 90),
            p99: nearest_rank(&elapsed, 99),
            slowest,
            per_instrument,
        })
    }
}

/// `sorted` must be non-empty.
fn nearest_rank(sorted: &[Duration], percentile: usize) -> Duration {
    let rank = (percentile * sorted.len()).div_ceil(100).max(1);
    sorted[rank - 1]
}
