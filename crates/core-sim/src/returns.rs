use std::{collections::BTreeMap, future::Future, sync::Arc};

use crate::{error::DataUnavailable, Symbol};

/// Non-empty, immutable sequence of historical percentage changes for one instrument.
///
/// Cloning shares the underlying buffer, so the engine and any other reader can hold
/// it without synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalReturns {
    values: Arc<[f64]>,
}

impl HistoricalReturns {
    pub fn new(symbol: &Symbol, values: Vec<f64>) -> Result<Self, DataUnavailable> {
        if values.is_empty() {
            return Err(DataUnavailable::EmptyHistory {
                symbol: symbol.clone(),
            });
        }

        Ok(Self {
            values: values.into(),
        })
    }

    /// Percentage changes between consecutive closes, `close[i] / close[i - 1] - 1`.
    pub fn from_closes(symbol: &Symbol, closes: &[f64]) -> Result<Self, DataUnavailable> {
        let changes = closes
            .windows(2)
            .map(|pair| pair[1] / pair[0] - 1.0)
            .collect();
        Self::new(symbol, changes)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Everything the engine needs to start one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeed {
    pub start_price: f64,
    pub returns: HistoricalReturns,
}

impl InstrumentSeed {
    pub fn new(
        symbol: &Symbol,
        start_price: f64,
        returns: HistoricalReturns,
    ) -> Result<Self, DataUnavailable> {
        if !start_price.is_finite() || start_price <= 0.0 {
            return Err(DataUnavailable::InvalidStartPrice {
                symbol: symbol.clone(),
                price: start_price,
            });
        }

        Ok(Self {
            start_price,
            returns,
        })
    }
}

pub type MarketSeeds = BTreeMap<Symbol, InstrumentSeed>;

/// Supplies the starting quote and the historical returns of every requested symbol.
pub trait HistoricalReturnsSource {
    fn load(
        &self,
        symbols: &[Symbol],
    ) -> impl Future<Output = Result<MarketSeeds, DataUnavailable>> + Send;
}

/// Loads seeds once and checks that every requested symbol came back.
/// Symbols the source returned but nobody asked for are dropped.
pub async fn load_seeds<S>(source: &S, symbols: &[Symbol]) -> Result<MarketSeeds, DataUnavailable>
where
    S: HistoricalReturnsSource,
{
    if symbols.is_empty() {
        return Err(DataUnavailable::NoInstruments);
    }

    let mut loaded = source.load(symbols).await?;
    let mut seeds = MarketSeeds::new();
    for symbol in symbols {
        let seed = loaded
            .remove(symbol)
            .ok_or_else(|| DataUnavailable::MissingInstrument {
                symbol: symbol.clone(),
            })?;
        seeds.insert(symbol.clone(), seed);
    }

    Ok(seeds)
}

/// In-memory source for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticReturnsSource {
    instruments: BTreeMap<Symbol, (f64, Vec<f64>)>,
}

impl StaticReturnsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instrument(
        mut self,
        symbol: impl Into<Symbol>,
        start_price: f64,
        returns: Vec<f64>,
    ) -> Self {
        self.instruments
            .insert(symbol.into(), (start_price, returns));
        self
    }
}

impl HistoricalReturnsSource for StaticReturnsSource {
    async fn load(&self, symbols: &[Symbol]) -> Result<MarketSeeds, DataUnavailable> {
        let mut seeds = MarketSeeds::new();
        for symbol in symbols {
            let Some((start_price, values)) = self.instruments.get(symbol) else {
                continue;
            };
            let returns = HistoricalReturns::new(symbol, values.clone())?;
            seeds.insert(
                symbol.clone(),
                InstrumentSeed::new(symbol, *start_price, returns)?,
            );
        }
        Ok(seeds)
    }
}
