//! Currency conversion service
//!
//! Computes pair rates from the oracle's reference-currency quotes.
//! A currency converted to itself is an identity (rate 1, no oracle call).
//! Rates and converted amounts are truncated to [`RATE_SCALE`] fractional
//! digits, always rounding toward zero.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::Currency;

use super::oracle::{RateError, RateOracle};

/// Fractional digits kept on rates and converted amounts.
pub const RATE_SCALE: u32 = 4;

#[derive(Clone)]
pub struct CurrencyConverter {
    oracle: Arc<dyn RateOracle>,
}

impl CurrencyConverter {
    pub fn new(oracle: Arc<dyn RateOracle>) -> Self {
        Self { oracle }
    }

    /// Rate for converting `from` into `to`.
    ///
    /// Identity conversions return exactly 1 without consulting the oracle.
    /// Otherwise the result is `quote(from) / quote(to)` truncated to
    /// [`RATE_SCALE`] digits. No caching: every non-identity call may hit
    /// the external source.
    pub async fn rate(&self, from: Currency, to: Currency) -> Result<Decimal, RateError> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        let quotes = self.oracle.quotes().await?;
        let from_quote = *quotes.get(&from).ok_or(RateError::MissingQuote(from))?;
        let to_quote = *quotes.get(&to).ok_or(RateError::MissingQuote(to))?;

        if to_quote.is_zero() {
            return Err(RateError::Malformed(format!("zero quote for {to}")));
        }

        Ok((from_quote / to_quote).trunc_with_scale(RATE_SCALE))
    }

    /// Apply an already-obtained rate to an amount.
    pub fn apply(rate: Decimal, amount: Decimal) -> Decimal {
        (amount * rate).trunc_with_scale(RATE_SCALE)
    }

    /// Convenience: `apply(rate(from, to), amount)`.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
    ) -> Result<Decimal, RateError> {
        if from == to {
            return Ok(amount);
        }
        let rate = self.rate(from, to).await?;
        Ok(Self::apply(rate, amount))
    }
}
