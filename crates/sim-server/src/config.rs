use std::{
    collections::BTreeSet,
    env,
    net::{AddrParseError, SocketAddr},
    time::Duration,
};

use core_sim::{SimConfig, Symbol};
use thiserror::Error;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SYMBOLS: &str = "AAPL,GOOG,TSLA,AMZN";
const DEFAULT_CHART_POLL_MS: u64 = 1_000;
const DEFAULT_HISTORY_RANGE: &str = "5y";
const DEFAULT_DATA_BASE_URL: &str = "https://query1.finance.yahoo.com";

const ENV_ADDR: &str = "SIM_SERVER_ADDR";
const ENV_SYMBOLS: &str = "SIM_SYMBOLS";
const ENV_TICK_INTERVAL_MS: &str = "SIM_TICK_INTERVAL_MS";
const ENV_TOTAL_STEPS: &str = "SIM_TOTAL_STEPS";
const ENV_CHART_POLL_MS: &str = "SIM_CHART_POLL_MS";
const ENV_SEED: &str = "SIM_SEED";
const ENV_HISTORY_RANGE: &str = "SIM_HISTORY_RANGE";
const ENV_DATA_BASE_URL: &str = "SIM_DATA_BASE_URL";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub symbols: Vec<Symbol>,
    pub sim: SimConfig,
    pub chart_poll_interval: Duration,
    pub seed: Option<u64>,
    pub history_range: String,
    pub data_base_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SIM_SERVER_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),
    #[error("SIM_SYMBOLS must list at least one symbol, separated by commas")]
    InvalidSymbols,
    #[error("SIM_SYMBOLS lists {0} more than once")]
    DuplicateSymbol(String),
    #[error("SIM_TICK_INTERVAL_MS must be a positive number of milliseconds")]
    InvalidTickInterval,
    #[error("SIM_TOTAL_STEPS must be a non-negative integer")]
    InvalidTotalSteps,
    #[error("SIM_CHART_POLL_MS must be a positive number of milliseconds")]
    InvalidChartPollInterval,
    #[error("SIM_SEED must be an unsigned 64-bit integer")]
    InvalidSeed,
    #[error("SIM_HISTORY_RANGE must not be empty or whitespace")]
    InvalidHistoryRange,
    #[error("SIM_DATA_BASE_URL must start with http:// or https://")]
    InvalidDataBaseUrl,
    #[error("{key} contains non-unicode data")]
    NonUnicode { key: &'static str },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = read_env(ENV_ADDR)?
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned())
            .parse()
            .map_err(ConfigError::InvalidListenAddr)?;

        let symbols = parse_symbols(
            read_env(ENV_SYMBOLS)?
                .as_deref()
                .unwrap_or(DEFAULT_SYMBOLS),
        )?;

        let defaults = SimConfig::default();
        let tick_interval = match read_env(ENV_TICK_INTERVAL_MS)? {
            Some(value) => parse_positive_millis(&value).ok_or(ConfigError::InvalidTickInterval)?,
            None => defaults.tick_interval,
        };

        let total_steps = match read_env(ENV_TOTAL_STEPS)? {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTotalSteps)?,
            None => defaults.total_steps,
        };

        let chart_poll_interval = match read_env(ENV_CHART_POLL_MS)? {
            Some(value) => {
                parse_positive_millis(&value).ok_or(ConfigError::InvalidChartPollInterval)?
            }
            None => Duration::from_millis(DEFAULT_CHART_POLL_MS),
        };

        let seed = read_env(ENV_SEED)?
            .map(|value| value.trim().parse::<u64>())
            .transpose()
            .map_err(|_| ConfigError::InvalidSeed)?;

        let history_range = match read_env(ENV_HISTORY_RANGE)? {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::InvalidHistoryRange);
            }
            Some(value) => value.trim().to_owned(),
            None => DEFAULT_HISTORY_RANGE.to_owned(),
        };

        let data_base_url = match read_env(ENV_DATA_BASE_URL)? {
            Some(value) if !is_http_url(value.trim()) => {
                return Err(ConfigError::InvalidDataBaseUrl);
            }
            Some(value) => value.trim().to_owned(),
            None => DEFAULT_DATA_BASE_URL.to_owned(),
        };

        Ok(Self {
            listen_addr,
            symbols,
            sim: SimConfig {
                tick_interval,
                total_steps,
            },
            chart_poll_interval,
            seed,
            history_range,
            data_base_url,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode { key }),
    }
}

fn parse_symbols(value: &str) -> Result<Vec<Symbol>, ConfigError> {
    let mut seen = BTreeSet::new();
    let mut symbols = Vec::new();
    for raw in value.split(',') {
        let symbol = raw.trim();
        if symbol.is_empty() {
            return Err(ConfigError::InvalidSymbols);
        }
        if !seen.insert(symbol.to_owned()) {
            return Err(ConfigError::DuplicateSymbol(symbol.to_owned()));
        }
        symbols.push(Symbol::from(symbol));
    }
    Ok(symbols)
}

fn parse_positive_millis(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(millis) => Some(Duration::from_millis(millis)),
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
