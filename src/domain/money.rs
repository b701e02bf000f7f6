//! Monetary value types
//!
//! Domain primitives for operation amounts and account funds. Both are
//! validated at construction time, so invalid values cannot enter the
//! engine.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum representable value (fits NUMERIC(19, 4)).
const MAX_VALUE: &str = "1000000000000";

/// Maximum decimal places for any monetary value.
pub const MONEY_SCALE: u32 = 4;

/// Errors raised when constructing a monetary value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Amount must not be negative (got {0})")]
    Negative(Decimal),

    #[error("Amount has too many decimal places (max {MONEY_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_VALUE})")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    Parse(String),
}

fn validate(value: Decimal) -> Result<Decimal, MoneyError> {
    if value < Decimal::ZERO {
        return Err(MoneyError::Negative(value));
    }
    if value.scale() > MONEY_SCALE {
        return Err(MoneyError::TooManyDecimals(value.scale()));
    }
    let max = Decimal::from_str(MAX_VALUE).expect("Invalid MAX_VALUE constant");
    if value > max {
        return Err(MoneyError::Overflow);
    }
    Ok(value)
}

/// A validated operation amount. Zero is permitted; negatives are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        validate(value).map(Self)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl FromStr for Amount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| MoneyError::Parse(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<String> for Amount {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        format!("{:.4}", amount.0)
    }
}

/// Account funds. Never negative after any committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Funds(Decimal);

impl Funds {
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        validate(value).map(Self)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Whether a debit of `amount` would keep funds non-negative.
    pub fn is_sufficient_for(&self, amount: &Amount) -> bool {
        self.0 >= amount.value()
    }

    pub fn credit(&self, amount: &Amount) -> Result<Funds, MoneyError> {
        Funds::new(self.0 + amount.value())
    }

    pub fn debit(&self, amount: &Amount) -> Result<Funds, MoneyError> {
        Funds::new(self.0 - amount.value())
    }
}

impl Default for Funds {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Funds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl FromStr for Funds {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| MoneyError::Parse(e.to_string()))?;
        Funds::new(decimal)
    }
}

impl TryFrom<String> for Funds {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Funds> for String {
    fn from(funds: Funds) -> Self {
        format!("{:.4}", funds.0)
    }
}
