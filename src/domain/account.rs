//! Account records
//!
//! An account holds funds in a single currency and belongs to exactly one
//! user. Balances change only through operation processing or an explicit
//! ledger update.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{AccountId, Currency, Funds, UserId};

/// A persisted account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub funds: Funds,
    pub currency: Currency,
    pub created_on: NaiveDate,
}

/// Input for creating an account. Funds are validated non-negative at
/// construction of [`Funds`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub user_id: UserId,
    pub funds: Funds,
    pub currency: Currency,
}

/// The mutable portion of an account for an explicit ledger update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub funds: Funds,
    pub currency: Currency,
}
