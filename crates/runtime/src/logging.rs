use core_sim::{year_of_step, InvalidObservation, Symbol};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLogEventKind {
    TickApplied,
    PriceUpdated,
    ObservationSkipped,
    HorizonReached,
    ShutdownRequested,
    RunAborted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunLogEvent {
    pub step: u64,
    pub total_steps: u64,
    pub kind: RunLogEventKind,
    pub symbol: Option<Symbol>,
    pub price: Option<f64>,
    pub detail: Option<String>,
}

impl RunLogEvent {
    pub fn new(step: u64, total_steps: u64, kind: RunLogEventKind) -> Self {
        Self {
            step,
            total_steps,
            kind,
            symbol: None,
            price: None,
            detail: None,
        }
    }

    pub fn price_updated(step: u64, total_steps: u64, symbol: &Symbol, price: f64) -> Self {
        Self {
            symbol: Some(symbol.clone()),
            price: Some(price),
            ..Self::new(step, total_steps, RunLogEventKind::PriceUpdated)
        }
    }

    pub fn observation_skipped(
        step: u64,
        total_steps: u64,
        symbol: &Symbol,
        kept_price: f64,
        reason: &InvalidObservation,
    ) -> Self {
        Self {
            symbol: Some(symbol.clone()),
            price: Some(kept_price),
            detail: Some(reason.to_string()),
            ..Self::new(step, total_steps, RunLogEventKind::ObservationSkipped)
        }
    }
}

pub trait RunLogWriter {
    fn write(&mut self, event: RunLogEvent);
}

#[derive(Debug, Default)]
pub struct InMemoryRunLogWriter {
    events: Vec<RunLogEvent>,
}

impl InMemoryRunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RunLogEvent] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<RunLogEventKind> {
        self.events.iter().map(|event| event.kind).collect()
    }
}

impl RunLogWriter for InMemoryRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        self.events.push(event);
    }
}

/// Forwards run-log events to `tracing`, one line per month plus one per instrument.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunLogWriter;

impl RunLogWriter for TracingRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        let symbol = event.symbol.as_ref().map(Symbol::as_str).unwrap_or_default();
        let price = event.price.unwrap_or_default();
        match event.kind {
            RunLogEventKind::TickApplied => info!(
                step = event.step,
                "Month {}/{} (Year {})",
                event.step,
                event.total_steps,
                year_of_step(event.step)
            ),
            RunLogEventKind::PriceUpdated => {
                info!(step = event.step, symbol, price, "  {symbol}: ${price:.2}")
            }
            RunLogEventKind::ObservationSkipped => warn!(
                step = event.step,
                symbol,
                kept_price = price,
                reason = event.detail.as_deref().unwrap_or_default(),
                "skipped unusable observation"
            ),
            RunLogEventKind::HorizonReached => info!(
                step = event.step,
                total_steps = event.total_steps,
                "simulation reached its horizon"
            ),
            RunLogEventKind::ShutdownRequested => info!(
                step = event.step,
                total_steps = event.total_steps,
                "simulation stopped by shutdown request"
            ),
            RunLogEventKind::RunAborted => warn!(
                step = event.step,
                total_steps = event.total_steps,
                "simulation aborted: clock and market state disagree"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use core_sim::{InvalidObservation, Symbol};

    use super::{InMemoryRunLogWriter, RunLogEvent, RunLogEventKind, RunLogWriter};

    #[test]
    fn in_memory_writer_keeps_events_in_order() {
        let mut writer = InMemoryRunLogWriter::new();
        let symbol = Symbol::from("AAPL");

        writer.write(RunLogEvent::new(1, 2, RunLogEventKind::TickApplied));
        writer.write(RunLogEvent::price_updated(1, 2, &symbol, 105.0));

        assert_eq!(
            writer.kinds(),
            vec![RunLogEventKind::TickApplied, RunLogEventKind::PriceUpdated]
        );
        assert_eq!(writer.events()[1].symbol.as_ref(), Some(&symbol));
        assert_eq!(writer.events()[1].price, Some(105.0));
    }

    #[test]
    fn skipped_observation_carries_reason_and_kept_price() {
        let event = RunLogEvent::observation_skipped(
            4,
            240,
            &Symbol::from("TSLA"),
            210.5,
            &InvalidObservation::NonFiniteReturn(f64::NAN),
        );

        assert_eq!(event.kind, RunLogEventKind::ObservationSkipped);
        assert_eq!(event.price, Some(210.5));
        assert_eq!(event.detail.as_deref(), Some("drawn return NaN is not finite"));
    }
}
