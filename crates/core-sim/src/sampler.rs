use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{HistoricalReturns, Symbol};

/// Picks the percentage change applied to one instrument for one tick.
pub trait ReturnSampler {
    fn draw(&mut self, symbol: &Symbol, returns: &HistoricalReturns) -> f64;
}

/// Uniform draw with replacement from the historical sequence. Draws are independent
/// per instrument and per tick, so the same observation can come up repeatedly.
#[derive(Debug, Clone)]
pub struct UniformResampler<R = StdRng> {
    rng: R,
}

impl UniformResampler<StdRng> {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> UniformResampler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ReturnSampler for UniformResampler<R> {
    fn draw(&mut self, _symbol: &Symbol, returns: &HistoricalReturns) -> f64 {
        let values = returns.as_slice();
        values[self.rng.gen_range(0..values.len())]
    }
}
