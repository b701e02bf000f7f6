//! Withdrawal processor
//!
//! Moves funds out of an account. The balance check reads the row under a
//! lock inside the same transaction as the write, so two concurrent
//! withdrawals cannot both observe a stale sufficient balance.

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

/// A validated withdrawal to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalRequest {
    pub account_id: AccountId,
    pub amount: Amount,
    /// Currency the amount is denominated in; may differ from the
    /// account's currency.
    pub currency: Currency,
}

impl AccountScoped for WithdrawalRequest {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}

#[derive(Clone)]
pub struct WithdrawalProcessor {
    pool: PgPool,
    converter: CurrencyConverter,
    operations: OperationStore,
}

impl WithdrawalProcessor {
    pub fn new(pool: PgPool, converter: CurrencyConverter) -> Self {
        Self {
            operations: OperationStore::new(pool.clone()),
            pool,
            converter,
        }
    }
}

#[async_trait]
impl OperationService for WithdrawalProcessor {
    type Request = WithdrawalRequest;

    async fn process(&self, identity: &Identity, request: Self::Request) -> AppResult<Operation> {
        let mut tx = self.pool.begin().await?;

        let account = AccountLedger::fetch_for_update(&mut tx, request.account_id)
            .await?
            .ok_or(DomainError::AccountNotFound(request.account_id))?;

        let rate = self.converter.rate(request.currency, account.currency).await?;
        let debited = Amount::new(CurrencyConverter::apply(rate, request.amount.value()))?;

        // On failure the transaction is dropped: no record, no mutation.
        if !account.funds.is_sufficient_for(&debited) {
            return Err(DomainError::insufficient_funds(
                debited.value(),
                account.funds.value(),
            )
            .into());
        }

        let funds = account.funds.debit(&debited)?;
        AccountLedger::store_funds(&mut tx, account.id, &funds).await?;

        let record = NewOperation::withdrawal(
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
            "Withdrawal processed"
        );

        Ok(operation)
    }

    async fn get_by_id(&self, _identity: &Identity, id: OperationId) -> AppResult<Operation> {
        self.operations
            .get_by_id(OperationKind::Withdrawal, id)
            .await
    }

    async fn get_by_account_id(
        &self,
        _identity: &Identity,
        account_id: AccountId,
    ) -> AppResult<Vec<Operation>> {
        self.operations
            .get_by_account_id(OperationKind::Withdrawal, account_id)
            .await
    }

    async fn get_by_user_id(
        &self,
        _identity: &Identity,
        user_id: UserId,
    ) -> AppResult<Vec<Operation>> {
        self.operations
            .get_by_user_id(OperationKind::Withdrawal, user_id)
            .await
    }
}
