use core_sim::{
    round_price, DataUnavailable, HistoricalReturns, HistoricalReturnsSource, InstrumentSeed,
    MarketSeeds, Symbol,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseChartError {
    #[error("chart payload is not valid json")]
    InvalidJson,
    #[error("chart service reported {code}: {description}")]
    Upstream { code: String, description: String },
    #[error("chart payload has no result")]
    NoResult,
    #[error("chart payload has no usable closes")]
    NoCloses,
}

/// Daily closes (missing days dropped) and the most recent quote for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub closes: Vec<f64>,
    pub latest_price: f64,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartFailure>,
}

#[derive(Debug, Deserialize)]
struct ChartFailure {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
    #[serde(default)]
    adjclose: Vec<AdjCloseSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseSeries {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Prefers adjusted closes when present. The latest price falls back to the last close.
pub fn parse_chart_payload(payload: &str) -> Result<ChartSeries, ParseChartError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(payload).map_err(|_| ParseChartError::InvalidJson)?;

    if let Some(failure) = envelope.chart.error {
        return Err(ParseChartError::Upstream {
            code: failure.code,
            description: failure.description,
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or(ParseChartError::NoResult)?;

    let raw_closes = result
        .indicators
        .adjclose
        .into_iter()
        .map(|series| series.adjclose)
        .find(|closes| !closes.is_empty())
        .or_else(|| {
            result
                .indicators
                .quote
                .into_iter()
                .map(|series| series.close)
                .find(|closes| !closes.is_empty())
        })
        .ok_or(ParseChartError::NoCloses)?;

    let closes: Vec<f64> = raw_closes
        .into_iter()
        .flatten()
        .filter(|close| close.is_finite() && *close > 0.0)
        .collect();
    let last_close = *closes.last().ok_or(ParseChartError::NoCloses)?;
    let latest_price = result
        .meta
        .regular_market_price
        .filter(|price| price.is_finite() && *price > 0.0)
        .unwrap_or(last_close);

    Ok(ChartSeries {
        closes,
        latest_price,
    })
}

/// Historical daily returns from the Yahoo Finance chart API.
#[derive(Debug, Clone)]
pub struct YahooChartSource {
    client: reqwest::Client,
    base_url: String,
    range: String,
}

impl YahooChartSource {
    pub fn new(base_url: &str, range: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sim-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            range: range.to_owned(),
        })
    }

    fn chart_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/v8/finance/chart/{symbol}?range={}&interval=1d",
            self.base_url, self.range
        )
    }

    async fn fetch_seed(&self, symbol: &Symbol) -> Result<InstrumentSeed, DataUnavailable> {
        let unreachable = |reason: String| DataUnavailable::SourceUnreachable {
            symbol: symbol.clone(),
            reason,
        };

        let payload = self
            .client
            .get(self.chart_url(symbol))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| unreachable(err.to_string()))?
            .text()
            .await
            .map_err(|err| unreachable(err.to_string()))?;

        seed_from_payload(symbol, &payload)
    }
}

impl HistoricalReturnsSource for YahooChartSource {
    async fn load(&self, symbols: &[Symbol]) -> Result<MarketSeeds, DataUnavailable> {
        let mut seeds = MarketSeeds::new();
        for symbol in symbols {
            let seed = self.fetch_seed(symbol).await?;
            info!(
                %symbol,
                observations = seed.returns.len(),
                start_price = seed.start_price,
                "loaded historical returns"
            );
            seeds.insert(symbol.clone(), seed);
        }
        Ok(seeds)
    }
}

fn seed_from_payload(symbol: &Symbol, payload: &str) -> Result<InstrumentSeed, DataUnavailable> {
    let series = match parse_chart_payload(payload) {
        Ok(series) => series,
        Err(ParseChartError::NoCloses) => {
            return Err(DataUnavailable::EmptyHistory {
                symbol: symbol.clone(),
            });
        }
        Err(err) => {
            return Err(DataUnavailable::SourceUnreachable {
                symbol: symbol.clone(),
                reason: err.to_string(),
            });
        }
    };

    let returns = HistoricalReturns::from_closes(symbol, &series.closes)?;
    let start_price = round_price(series.latest_price).unwrap_or(series.latest_price);
    InstrumentSeed::new(symbol, start_price, returns)
}
