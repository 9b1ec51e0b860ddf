use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub step: u64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub price: f64,
    pub history: Vec<PricePoint>,
}

impl InstrumentSnapshot {
    pub fn latest_step(&self) -> Option<u64> {
        self.history.last().map(|point| point.step)
    }

    /// Ordered `(step, price)` samples, the shape a chart consumes.
    pub fn samples(&self) -> Vec<(u64, f64)> {
        self.history
            .iter()
            .map(|point| (point.step, point.price))
            .collect()
    }
}

/// Copy of the whole market as of one completed tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub step: u64,
    pub total_steps: u64,
    pub instruments: BTreeMap<Symbol, InstrumentSnapshot>,
}

impl MarketSnapshot {
    /// No tick has completed yet: starting prices and empty histories.
    pub fn is_initial(&self) -> bool {
        self.step == 0
    }

    pub fn finished(&self) -> bool {
        self.step >= self.total_steps
    }
}
