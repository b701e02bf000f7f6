//! API module
//!
//! HTTP API endpoints, middleware and the service composition they run
//! against.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::ledger::AccountLedger;
use crate::processing::{ReplenishmentProcessor, TransferProcessor, WithdrawalProcessor};
use crate::rates::CurrencyConverter;
use crate::security::Secured;

pub use routes::create_router;

/// Shared application state: the explicitly composed service stack. Every
/// service handlers can reach is already wrapped in its authorization
/// proxy.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub accounts: Arc<Secured<AccountLedger>>,
    pub replenishments: Arc<Secured<ReplenishmentProcessor>>,
    pub withdrawals: Arc<Secured<WithdrawalProcessor>>,
    pub transfers: Arc<Secured<TransferProcessor>>,
}

impl AppState {
    pub fn new(pool: PgPool, converter: CurrencyConverter) -> Self {
        let ledger = AccountLedger::new(pool.clone());

        Self {
            accounts: Arc::new(Secured::new(ledger.clone(), ledger.clone())),
            replenishments: Arc::new(Secured::new(
                ReplenishmentProcessor::new(pool.clone(), converter.clone()),
                ledger.clone(),
            )),
            withdrawals: Arc::new(Secured::new(
                WithdrawalProcessor::new(pool.clone(), converter.clone()),
                ledger.clone(),
            )),
            transfers: Arc::new(Secured::new(
                TransferProcessor::new(pool.clone(), converter),
                ledger,
            )),
            pool,
        }
    }
}
