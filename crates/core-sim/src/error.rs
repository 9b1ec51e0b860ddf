use thiserror::Error;

use crate::Symbol;

/// Historical data could not be loaded at startup. Fatal: no tick may run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataUnavailable {
    #[error("no instruments were requested")]
    NoInstruments,
    #[error("no historical observations for {symbol}")]
    EmptyHistory { symbol: Symbol },
    #[error("source returned no data for {symbol}")]
    MissingInstrument { symbol: Symbol },
    #[error("starting price {price} for {symbol} is not a positive finite number")]
    InvalidStartPrice { symbol: Symbol, price: f64 },
    #[error("source unreachable for {symbol}: {reason}")]
    SourceUnreachable { symbol: Symbol, reason: String },
}

/// A drawn return could not be applied. The instrument keeps its price for that tick.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidObservation {
    #[error("drawn return {0} is not finite")]
    NonFiniteReturn(f64),
    #[error("price {0} cannot be rounded to cents")]
    Unroundable(f64),
    #[error("return {drawn} would move price {price} to {next}")]
    NonPositivePrice { price: f64, drawn: f64, next: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("step {step} does not follow already applied step {applied}")]
pub struct StepOutOfOrder {
    pub step: u64,
    pub applied: u64,
}
