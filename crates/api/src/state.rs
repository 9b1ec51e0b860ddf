use std::{collections::BTreeMap, time::Duration};

use core_sim::{MarketSnapshot, Symbol};
use runtime::SnapshotReader;
use serde::Serialize;

pub const DEFAULT_CHART_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// `{ "price", "history": [prices], "months": [steps] }` per symbol.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StockEntry {
    pub price: f64,
    pub history: Vec<f64>,
    pub months: Vec<u64>,
}

pub type StocksResponse = BTreeMap<Symbol, StockEntry>;

impl StockEntry {
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> StocksResponse {
        snapshot
            .instruments
            .iter()
            .map(|(symbol, instrument)| {
                let (months, history): (Vec<u64>, Vec<f64>) = instrument
                    .history
                    .iter()
                    .map(|point| (point.step, point.price))
                    .unzip();
                (
                    symbol.clone(),
                    StockEntry {
                        price: instrument.price,
                        history,
                        months,
                    },
                )
            })
            .collect()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SnapshotResponse<'a> {
    #[serde(flatten)]
    pub snapshot: &'a MarketSnapshot,
    pub finished: bool,
}

impl<'a> From<&'a MarketSnapshot> for SnapshotResponse<'a> {
    fn from(snapshot: &'a MarketSnapshot) -> Self {
        Self {
            snapshot,
            finished: snapshot.finished(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum FeedEvent {
    Connected {
        step: u64,
        total_steps: u64,
    },
    ChartFrame {
        step: u64,
        total_steps: u64,
        finished: bool,
        prices: BTreeMap<Symbol, f64>,
        series: BTreeMap<Symbol, Vec<(u64, f64)>>,
    },
}

impl FeedEvent {
    pub fn connected(snapshot: &MarketSnapshot) -> Self {
        Self::Connected {
            step: snapshot.step,
            total_steps: snapshot.total_steps,
        }
    }

    pub fn chart_frame(snapshot: &MarketSnapshot) -> Self {
        Self::ChartFrame {
            step: snapshot.step,
            total_steps: snapshot.total_steps,
            finished: snapshot.finished(),
            prices: snapshot
                .instruments
                .iter()
                .map(|(symbol, instrument)| (symbol.clone(), instrument.price))
                .collect(),
            series: snapshot
                .instruments
                .iter()
                .map(|(symbol, instrument)| (symbol.clone(), instrument.samples()))
                .collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    reader: SnapshotReader,
    chart_poll_interval: Duration,
}

impl AppState {
    pub fn new(reader: SnapshotReader) -> Self {
        Self::with_chart_poll_interval(reader, DEFAULT_CHART_POLL_INTERVAL)
    }

    pub fn with_chart_poll_interval(reader: SnapshotReader, chart_poll_interval: Duration) -> Self {
        Self {
            reader,
            chart_poll_interval,
        }
    }

    pub fn reader(&self) -> &SnapshotReader {
        &self.reader
    }

    pub fn chart_poll_interval(&self) -> Duration {
        self.chart_poll_interval
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use core_sim::{InstrumentSnapshot, MarketSnapshot, PricePoint, Symbol};
    use serde_json::json;

    use super::{FeedEvent, StockEntry};

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            step: 2,
            total_steps: 240,
            instruments: BTreeMap::from([(
                Symbol::from("AAPL"),
                InstrumentSnapshot {
                    price: 110.25,
                    history: vec![
                        PricePoint { step: 1, price: 105.0 },
                        PricePoint { step: 2, price: 110.25 },
                    ],
                },
            )]),
        }
    }

    #[test]
    fn stock_entries_split_history_into_prices_and_months() {
        let stocks = StockEntry::from_snapshot(&snapshot());

        assert_eq!(
            serde_json::to_value(stocks).unwrap(),
            json!({
                "AAPL": { "price": 110.25, "history": [105.0, 110.25], "months": [1, 2] }
            })
        );
    }

    #[test]
    fn chart_frame_serializes_samples_as_pairs() {
        let frame = FeedEvent::chart_frame(&snapshot());

        assert_eq!(
            serde_json::to_value(frame).unwrap(),
            json!({
                "event_type": "chart_frame",
                "step": 2,
                "total_steps": 240,
                "finished": false,
                "prices": { "AAPL": 110.25 },
                "series": { "AAPL": [[1, 105.0], [2, 110.25]] }
            })
        );
    }

    #[test]
    fn chart_frame_before_the_first_tick_carries_starting_prices() {
        let initial = MarketSnapshot {
            step: 0,
            total_steps: 240,
            instruments: BTreeMap::from([(
                Symbol::from("AAPL"),
                InstrumentSnapshot {
                    price: 187.44,
                    history: Vec::new(),
                },
            )]),
        };

        assert_eq!(
            serde_json::to_value(FeedEvent::chart_frame(&initial)).unwrap(),
            json!({
                "event_type": "chart_frame",
                "step": 0,
                "total_steps": 240,
                "finished": false,
                "prices": { "AAPL": 187.44 },
                "series": { "AAPL": [] }
            })
        );
    }
}
