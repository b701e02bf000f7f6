//! Exchange rates
//!
//! Oracle adapter for the external quote source and the conversion service
//! built on top of it.

mod converter;
mod oracle;

pub use converter::{CurrencyConverter, RATE_SCALE};
pub use oracle::{HttpRateOracle, RateError, RateOracle};
