//! Operation records
//!
//! An operation is the immutable audit record of a single funds movement.
//! The three kinds share one table; `kind` discriminates and the optional
//! columns are populated per kind. Rows are created exactly once per
//! successful `process` call and never updated.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AccountId, Amount, Currency, OperationId, UserId};

/// Discriminator for the three operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Replenishment,
    Withdrawal,
    Transfer,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Replenishment => "replenishment",
            OperationKind::Withdrawal => "withdrawal",
            OperationKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized operation kinds read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operation kind: {0}")]
pub struct UnknownOperationKind(pub String);

impl FromStr for OperationKind {
    type Err = UnknownOperationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replenishment" => Ok(OperationKind::Replenishment),
            "withdrawal" => Ok(OperationKind::Withdrawal),
            "transfer" => Ok(OperationKind::Transfer),
            other => Err(UnknownOperationKind(other.to_string())),
        }
    }
}

/// A persisted operation row.
///
/// `to_user_id` / `to_account_id` are set for transfers only. `rate` is the
/// conversion rate applied when the operation was processed (1 when no
/// conversion happened), kept so the audit trail is reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub kind: OperationKind,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_user_id: Option<UserId>,
    pub account_id: AccountId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<AccountId>,
    pub amount: Decimal,
    pub currency: Currency,
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Fully resolved operation data, ready to be inserted by a processor
/// inside its transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub kind: OperationKind,
    pub user_id: UserId,
    pub to_user_id: Option<UserId>,
    pub account_id: AccountId,
    pub to_account_id: Option<AccountId>,
    pub amount: Decimal,
    pub currency: Currency,
    pub rate: Decimal,
}

impl NewOperation {
    pub fn replenishment(
        user_id: UserId,
        account_id: AccountId,
        amount: &Amount,
        currency: Currency,
        rate: Decimal,
    ) -> Self {
        Self {
            kind: OperationKind::Replenishment,
            user_id,
            to_user_id: None,
            account_id,
            to_account_id: None,
            amount: amount.value(),
            currency,
            rate,
        }
    }

    pub fn withdrawal(
        user_id: UserId,
        account_id: AccountId,
        amount: &Amount,
        currency: Currency,
        rate: Decimal,
    ) -> Self {
        Self {
            kind: OperationKind::Withdrawal,
            user_id,
            to_user_id: None,
            account_id,
            to_account_id: None,
            amount: amount.value(),
            currency,
            rate,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn transfer(
        user_id: UserId,
        to_user_id: UserId,
        account_id: AccountId,
        to_account_id: AccountId,
        amount: &Amount,
        currency: Currency,
        rate: Decimal,
    ) -> Self {
        Self {
            kind: OperationKind::Transfer,
            user_id,
            to_user_id: Some(to_user_id),
            account_id,
            to_account_id: Some(to_account_id),
            amount: amount.value(),
            currency,
            rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            OperationKind::Replenishment,
            OperationKind::Withdrawal,
            OperationKind::Transfer,
        ] {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_unknown() {
        assert!("mint".parse::<OperationKind>().is_err());
    }
}
