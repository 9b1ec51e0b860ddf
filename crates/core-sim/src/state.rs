use std::collections::BTreeMap;

use crate::{
    error::StepOutOfOrder,
    snapshot::{InstrumentSnapshot, MarketSnapshot, PricePoint},
    MarketSeeds, Symbol,
};

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentState {
    current_price: f64,
    history: Vec<PricePoint>,
}

impl InstrumentState {
    pub fn new(start_price: f64) -> Self {
        Self {
            current_price: start_price,
            history: Vec::new(),
        }
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn history(&self) -> &[PricePoint] {
        &self.history
    }

    fn record(&mut self, step: u64, price: f64) {
        self.current_price = price;
        self.history.push(PricePoint { step, price });
    }

    fn snapshot(&self) -> InstrumentSnapshot {
        InstrumentSnapshot {
            price: self.current_price,
            history: self.history.clone(),
        }
    }
}

/// Per-instrument prices and histories plus the last step applied to all of them.
///
/// Only the engine holds this mutably; everyone else sees [`MarketSnapshot`] copies.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketState {
    step: u64,
    instruments: BTreeMap<Symbol, InstrumentState>,
}

impl MarketState {
    pub fn new(start_prices: impl IntoIterator<Item = (Symbol, f64)>) -> Self {
        Self {
            step: 0,
            instruments: start_prices
                .into_iter()
                .map(|(symbol, price)| (symbol, InstrumentState::new(price)))
                .collect(),
        }
    }

    pub fn from_seeds(seeds: &MarketSeeds) -> Self {
        Self::new(
            seeds
                .iter()
                .map(|(symbol, seed)| (symbol.clone(), seed.start_price)),
        )
    }

    /// Last step applied, `0` before the first tick.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn instrument(&self, symbol: &str) -> Option<&InstrumentState> {
        self.instruments.get(symbol)
    }

    pub fn instruments(&self) -> impl Iterator<Item = (&Symbol, &InstrumentState)> {
        self.instruments.iter()
    }

    /// Applies one whole tick. Every instrument gains a `step` entry; instruments
    /// without a new price carry their current price forward.
    pub fn commit_tick(
        &mut self,
        step: u64,
        new_prices: &BTreeMap<Symbol, f64>,
    ) -> Result<(), StepOutOfOrder> {
        if step <= self.step {
            return Err(StepOutOfOrder {
                step,
                applied: self.step,
            });
        }

        for (symbol, instrument) in &mut self.instruments {
            let price = new_prices
                .get(symbol)
                .copied()
                .unwrap_or(instrument.current_price);
            instrument.record(step, price);
        }
        self.step = step;
        Ok(())
    }

    pub fn snapshot(&self, total_steps: u64) -> MarketSnapshot {
        MarketSnapshot {
            step: self.step,
            total_steps,
            instruments: self
                .instruments
                .iter()
                .map(|(symbol, instrument)| (symbol.clone(), instrument.snapshot()))
                .collect(),
        }
    }
}
