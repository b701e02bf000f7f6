//! moneta Library
//!
//! Multi-currency account and money movement engine. Re-exports modules
//! for the server binary, integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod processing;
pub mod rates;
pub mod security;

pub use config::Config;
pub use error::{AppError, AppResult};

pub use domain::{Account, Amount, Currency, Funds, Identity, Operation, OperationKind};
pub use ledger::{AccountLedger, AccountService};
pub use processing::OperationService;
pub use rates::{CurrencyConverter, HttpRateOracle, RateOracle};
pub use security::Secured;
