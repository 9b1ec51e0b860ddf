use std::{collections::BTreeMap, time::Instant};

use core_sim::{
    apply_return, HistoricalReturns, MarketSeeds, MarketState, ReturnSampler, StepOutOfOrder,
    Symbol,
};
use tracing::{info, warn};

use crate::{
    clock::{ShutdownSignal, SimulationClock},
    events::{RunOutcome, RunSummary, TickReport},
    logging::{RunLogEvent, RunLogEventKind, RunLogWriter, TracingRunLogWriter},
    metrics::{TickLatencyMetrics, TickTiming},
    snapshot::{snapshot_channel, SnapshotPublisher, SnapshotReader},
};

/// Single writer of the market. Each `advance` resamples one return per instrument,
/// commits the whole tick, then publishes a fresh snapshot.
pub struct SimulationEngine<S, L = TracingRunLogWriter> {
    state: MarketState,
    returns: BTreeMap<Symbol, HistoricalReturns>,
    sampler: S,
    run_log: L,
    publisher: SnapshotPublisher,
    total_steps: u64,
    metrics: TickLatencyMetrics,
}

impl<S: ReturnSampler, L: RunLogWriter> SimulationEngine<S, L> {
    pub fn new(seeds: MarketSeeds, total_steps: u64, sampler: S, run_log: L) -> Self {
        let state = MarketState::from_seeds(&seeds);
        let returns = seeds
            .into_iter()
            .map(|(symbol, seed)| (symbol, seed.returns))
            .collect();
        let (publisher, _) = snapshot_channel(state.snapshot(total_steps));

        Self {
            state,
            returns,
            sampler,
            run_log,
            publisher,
            total_steps,
            metrics: TickLatencyMetrics::new(),
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        self.publisher.reader()
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn run_log(&self) -> &L {
        &self.run_log
    }

    pub fn metrics(&self) -> &TickLatencyMetrics {
        &self.metrics
    }

    pub fn advance(&mut self, step: u64) -> Result<TickReport, StepOutOfOrder> {
        let started = Instant::now();
        let mut report = TickReport::new(step);
        let mut new_prices = BTreeMap::new();

        for (symbol, instrument) in self.state.instruments() {
            let Some(returns) = self.returns.get(symbol) else {
                continue;
            };
            let drawn = self.sampler.draw(symbol, returns);
            match apply_return(instrument.current_price(), drawn) {
                Ok(price) => {
                    new_prices.insert(symbol.clone(), price);
                    report.applied.push((symbol.clone(), price));
                }
                Err(reason) => report.skipped.push((symbol.clone(), reason)),
            }
        }

        self.state.commit_tick(step, &new_prices)?;
        self.publisher.publish(self.state.snapshot(self.total_steps));
        report.elapsed = started.elapsed();
        self.metrics.record(TickTiming {
            step,
            instruments: report.instruments(),
            elapsed: report.elapsed,
        });

        self.log_tick(&report);
        Ok(report)
    }

    /// Ticks until the clock reaches its horizon or shutdown is requested. A tick that
    /// has started always completes before the stop is observed.
    pub async fn run(&mut self, mut clock: SimulationClock, mut shutdown: ShutdownSignal) -> RunSummary {
        let mut aborted = None;
        while let Some(step) = clock.next_tick(&mut shutdown).await {
            if let Err(err) = self.advance(step) {
                warn!(%err, "clock and market state disagree; stopping");
                aborted = Some(err);
                break;
            }
        }

        let last_step = self.state.step();
        let (kind, outcome) = match aborted {
            Some(error) => (
                RunLogEventKind::RunAborted,
                RunOutcome::Aborted { last_step, error },
            ),
            None if clock.is_exhausted() => (
                RunLogEventKind::HorizonReached,
                RunOutcome::HorizonReached { steps: last_step },
            ),
            None => (
                RunLogEventKind::ShutdownRequested,
                RunOutcome::Stopped { last_step },
            ),
        };
        self.run_log
            .write(RunLogEvent::new(last_step, self.total_steps, kind));

        let latency = self.metrics.report();
        if let Some(report) = &latency {
            info!(
                ticks = report.ticks,
                p50 = ?report.p50,
                p99 = ?report.p99,
                slowest_step = report.slowest.step,
                slowest = ?report.slowest.elapsed,
                per_instrument = ?report.per_instrument,
                "tick latency"
            );
        }

        RunSummary { outcome, latency }
    }

    fn log_tick(&mut self, report: &TickReport) {
        let total_steps = self.total_steps;
        self.run_log.write(RunLogEvent::new(
            report.step,
            total_steps,
            RunLogEventKind::TickApplied,
        ));
        for (symbol, price) in &report.applied {
            self.run_log.write(RunLogEvent::price_updated(
                report.step,
                total_steps,
                symbol,
                *price,
            ));
        }
        for (symbol, reason) in &report.skipped {
            let kept_price = self
                .state
                .instrument(symbol.as_str())
                .map(|instrument| instrument.current_price())
                .unwrap_or_default();
            self.run_log.write(RunLogEvent::observation_skipped(
                report.step,
                total_steps,
                symbol,
                kept_price,
                reason,
            ));
        }
    }
}
