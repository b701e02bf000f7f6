//! Transfer processor
//!
//! Moves funds between two accounts, possibly across users and currencies.
//! Error precedence is fixed: same-account check, then destination
//! existence, then the balance check. Both account rows are locked in
//! ascending id order so opposite-direction transfers between the same
//! pair cannot deadlock.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{
    Account, AccountId, Amount, Currency, DomainError, Identity, NewOperation, Operation,
    OperationId, OperationKind, UserId,
};
use crate::error::AppResult;
use crate::ledger::{AccountLedger, OperationStore};
use crate::rates::CurrencyConverter;

use super::{AccountScoped, OperationService};

/// A validated transfer to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Amount,
    /// Client-supplied currency. Ignored: the source account's currency is
    /// authoritative and overwrites whatever was sent.
    pub currency: Option<Currency>,
}

impl AccountScoped for TransferRequest {
    fn account_id(&self) -> AccountId {
        self.from_account_id
    }
}

#[derive(Clone)]
pub struct TransferProcessor {
    pool: PgPool,
    converter: CurrencyConverter,
    operations: OperationStore,
}

impl TransferProcessor {
    pub fn new(pool: PgPool, converter: CurrencyConverter) -> Self {
        Self {
            operations: OperationStore::new(pool.clone()),
            pool,
            converter,
        }
    }
}

#[async_trait]
impl OperationService for TransferProcessor {
    type Request = TransferRequest;

    async fn process(&self, identity: &Identity, request: Self::Request) -> AppResult<Operation> {
        // Checked before any database access.
        if request.from_account_id == request.to_account_id {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let mut tx = self.pool.begin().await?;

        if !AccountLedger::exists(&mut tx, request.to_account_id).await? {
            return Err(DomainError::DestinationNotFound(request.to_account_id).into());
        }

        // Lock both rows in ascending id order regardless of direction.
        let (low_id, high_id) = if request.from_account_id < request.to_account_id {
            (request.from_account_id, request.to_account_id)
        } else {
            (request.to_account_id, request.from_account_id)
        };
        let low = AccountLedger::fetch_for_update(&mut tx, low_id).await?;
        let high = AccountLedger::fetch_for_update(&mut tx, high_id).await?;

        let (source, destination): (Option<Account>, Option<Account>) =
            if request.from_account_id == low_id {
                (low, high)
            } else {
                (high, low)
            };

        let source = source.ok_or(DomainError::AccountNotFound(request.from_account_id))?;
        let destination =
            destination.ok_or(DomainError::DestinationNotFound(request.to_account_id))?;

        // The source account's currency is authoritative for the record,
        // so the debit needs no conversion; only the credit does.
        let currency = source.currency;
        let rate = self
            .converter
            .rate(source.currency, destination.currency)
            .await?;

        if !source.funds.is_sufficient_for(&request.amount) {
            return Err(DomainError::insufficient_funds(
                request.amount.value(),
                source.funds.value(),
            )
            .into());
        }

        let credited = Amount::new(CurrencyConverter::apply(rate, request.amount.value()))?;

        let source_funds = source.funds.debit(&request.amount)?;
        let destination_funds = destination.funds.credit(&credited)?;

        AccountLedger::store_funds(&mut tx, source.id, &source_funds).await?;
        AccountLedger::store_funds(&mut tx, destination.id, &destination_funds).await?;

        let record = NewOperation::transfer(
            identity.user_id,
            destination.user_id,
            source.id,
            destination.id,
            &request.amount,
            currency,
            rate,
        );
        let operation = OperationStore::insert(&mut tx, &record).await?;

        tx.commit().await?;

        tracing::info!(
            operation_id = operation.id,
            from_account_id = source.id,
            to_account_id = destination.id,
            amount = %request.amount,
            currency = %currency,
            rate = %rate,
            "Transfer processed"
        );

        Ok(operation)
    }

    async fn get_by_id(&self, _identity: &Identity, id: OperationId) -> AppResult<Operation> {
        self.operations.get_by_id(OperationKind::Transfer, id).await
    }

    async fn get_by_account_id(
        &self,
        _identity: &Identity,
        account_id: AccountId,
    ) -> AppResult<Vec<Operation>> {
        self.operations
            .get_by_account_id(OperationKind::Transfer, account_id)
            .await
    }

    async fn get_by_user_id(
        &self,
        _identity: &Identity,
        user_id: UserId,
    ) -> AppResult<Vec<Operation>> {
        self.operations
            .get_by_user_id(OperationKind::Transfer, user_id)
            .await
    }
}
