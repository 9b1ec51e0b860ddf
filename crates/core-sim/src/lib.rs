mod config;
mod error;
mod pricing;
mod returns;
mod sampler;
mod snapshot;
mod state;
mod symbol;

pub use config::{year_of_step, SimConfig, MONTHS_PER_YEAR};
pub use error::{DataUnavailable, InvalidObservation, StepOutOfOrder};
pub use pricing::{apply_return, round_price, PRICE_DECIMALS};
pub use returns::{
    load_seeds, HistoricalReturns, HistoricalReturnsSource, InstrumentSeed, MarketSeeds,
    StaticReturnsSource,
};
pub use sampler::{ReturnSampler, UniformResampler};
pub use snapshot::{InstrumentSnapshot, MarketSnapshot, PricePoint};
pub use state::{InstrumentState, MarketState};
pub use symbol::Symbol;
