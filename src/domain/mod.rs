//! Domain module
//!
//! Core domain types and business rules.

pub mod account;
pub mod currency;
pub mod error;
pub mod identity;
pub mod money;
pub mod operation;

pub use account::{Account, AccountUpdate, NewAccount};
pub use currency::{Currency, UnknownCurrency};
pub use error::DomainError;
pub use identity::{Access, Grant, Identity, InvalidGrant, Resource, Scope};
pub use money::{Amount, Funds, MoneyError, MONEY_SCALE};
pub use operation::{NewOperation, Operation, OperationKind, UnknownOperationKind};

/// Row identifiers are plain integers assigned by the database.
pub type AccountId = i64;
pub type UserId = i64;
pub type OperationId = i64;
