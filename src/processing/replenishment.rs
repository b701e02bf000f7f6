//! Replenishment processor
//!
//! Moves external funds into an account. The operation amount may be
//! denominated in any supported currency; it is converted into the
//! account's currency before crediting.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{
    AccountId, Amount, Currency, DomainError, Identity, NewOperation, Operation, OperationId,
    OperationKind, UserId,
};
use crate::error::AppResult;
use crate::ledger::{AccountLedger, OperationStore};
use crate::rates::CurrencyConverter;

use super::{AccountScoped, OperationService};

/// A validated replenishment to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplenishmentRequest {
    pub account_id: AccountId,
    pub amount: Amount,
    /// Currency the amount is denominated in; may differ from the
    /// account's currency.
    pub currency: Currency,
}

impl AccountScoped for ReplenishmentRequest {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}

#[derive(Clone)]
pub struct ReplenishmentProcessor {
    pool: PgPool,
    converter: CurrencyConverter,
    operations: OperationStore,
}

impl ReplenishmentProcessor {
    pub fn new(pool: PgPool, converter: CurrencyConverter) -> Self {
        Self {
            operations: OperationStore::new(pool.clone()),
            pool,
            converter,
        }
    }
}

#[async_trait]
impl OperationService for ReplenishmentProcessor {
    type Request = ReplenishmentRequest;

    async fn process(&self, identity: &Identity, request: Self::Request) -> AppResult<Operation> {
        let mut tx = self.pool.begin().await?;

        let account = AccountLedger::fetch_for_update(&mut tx, request.account_id)
            .await?
            .ok_or(DomainError::AccountNotFound(request.account_id))?;

        let rate = self.converter.rate(request.currency, account.currency).await?;
        let credited = Amount::new(CurrencyConverter::apply(rate, request.amount.value()))?;

        let funds = account.funds.credit(&credited)?;
        AccountLedger::store_funds(&mut tx, account.id, &funds).await?;

        let record = NewOperation::replenishment(
            identity.user_id,
            account.id,
            &request.amount,
            request.currency,
            rate,
        );
        let operation = OperationStore::insert(&mut tx, &record).await?;

        tx.commit().await?;

        tracing::info!(
            operation_id = operation.id,
            account_id = account.id,
            amount = %request.amount,
            currency = %request.currency,
            "Replenishment processed"
        );

        Ok(operation)
    }

    async fn get_by_id(&self, _identity: &Identity, id: OperationId) -> AppResult<Operation> {
        self.operations
            .get_by_id(OperationKind::Replenishment, id)
            .await
    }

    async fn get_by_account_id(
        &self,
        _identity: &Identity,
        account_id: AccountId,
    ) -> AppResult<Vec<Operation>> {
        self.operations
            .get_by_account_id(OperationKind::Replenishment, account_id)
            .await
    }

    async fn get_by_user_id(
        &self,
        _identity: &Identity,
        user_id: UserId,
    ) -> AppResult<Vec<Operation>> {
        self.operations
            .get_by_user_id(OperationKind::Replenishment, user_id)
            .await
    }
}
