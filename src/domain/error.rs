//! Domain error types
//!
//! Business rule violations, independent of the web and storage layers.

use rust_decimal::Decimal;
use thiserror::Error;

use super::money::MoneyError;
use super::{AccountId, OperationId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Debit would take the account below zero.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Transfer source and destination are the same account.
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// Transfer destination account does not exist.
    #[error("Destination account not found: {0}")]
    DestinationNotFound(AccountId),

    /// Referenced account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Referenced operation record does not exist.
    #[error("Operation not found: {0}")]
    OperationNotFound(OperationId),

    /// Malformed monetary value, caught before any persistence access.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),
}

impl DomainError {
    pub fn insufficient_funds(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// Client errors get 4xx responses; everything else is a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. }
                | Self::SameAccountTransfer
                | Self::DestinationNotFound(_)
                | Self::AccountNotFound(_)
                | Self::OperationNotFound(_)
                | Self::InvalidAmount(_)
        )
    }
}
