//! Exchange rate oracle adapter
//!
//! Fetches the current quote table from the external rate source. Every
//! quote is expressed against the reference currency. The adapter is a
//! black box to the rest of the engine: any transport failure or malformed
//! payload is a hard [`RateError`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::Currency;

/// Failures while obtaining quotes. Not retried internally; the enclosing
/// operation aborts and the caller decides whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("Rate source unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Malformed rate payload: {0}")]
    Malformed(String),

    #[error("No quote published for {0}")]
    MissingQuote(Currency),
}

/// Source of currency quotes against [`Currency::REFERENCE`].
#[async_trait]
pub trait RateOracle: Send + Sync {
    async fn quotes(&self) -> Result<HashMap<Currency, Decimal>, RateError>;
}

/// Wire format of the oracle endpoint.
#[derive(Debug, Deserialize)]
struct QuotePayload {
    base: String,
    quotes: HashMap<String, Decimal>,
}

/// HTTP implementation querying the configured oracle endpoint.
#[derive(Debug, Clone)]
pub struct HttpRateOracle {
    client: reqwest::Client,
    url: String,
}

impl HttpRateOracle {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RateOracle for HttpRateOracle {
    async fn quotes(&self) -> Result<HashMap<Currency, Decimal>, RateError> {
        let payload: QuotePayload = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| RateError::Malformed(e.to_string()))?;

        if payload.base != Currency::REFERENCE.as_str() {
            return Err(RateError::Malformed(format!(
                "unexpected base currency: {}",
                payload.base
            )));
        }

        let mut quotes = HashMap::with_capacity(payload.quotes.len());
        for (code, quote) in payload.quotes {
            // Codes outside the supported set are not requestable; skip them.
            let Ok(currency) = code.parse::<Currency>() else {
                tracing::debug!(code = %code, "Ignoring quote for unsupported currency");
                continue;
            };
            if quote <= Decimal::ZERO {
                return Err(RateError::Malformed(format!(
                    "non-positive quote {quote} for {currency}"
                )));
            }
            quotes.insert(currency, quote);
        }

        Ok(quotes)
    }
}
