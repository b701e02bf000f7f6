//! Account ledger service
//!
//! Owns account records and the non-negative funds invariant (enforced by
//! the [`Funds`] type on the way in and a CHECK constraint at rest).

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::domain::{
    Account, AccountId, AccountUpdate, DomainError, Funds, Identity, NewAccount, UserId,
};
use crate::error::{AppError, AppResult};

/// Capability interface for account management. Every method takes the
/// acting identity so the authorization proxy can share the interface;
/// the ledger itself ignores it.
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn create(&self, identity: &Identity, new: NewAccount) -> AppResult<Account>;
    async fn update_by_id(
        &self,
        identity: &Identity,
        id: AccountId,
        update: AccountUpdate,
    ) -> AppResult<Account>;
    async fn delete_by_id(&self, identity: &Identity, id: AccountId) -> AppResult<()>;
    async fn get_by_id(&self, identity: &Identity, id: AccountId) -> AppResult<Account>;
    async fn get_by_user_id(&self, identity: &Identity, user_id: UserId)
        -> AppResult<Vec<Account>>;
    async fn exists_by_id(&self, identity: &Identity, id: AccountId) -> AppResult<bool>;
}

type AccountRow = (i64, i64, Decimal, String, NaiveDate);

fn account_from_row(row: AccountRow) -> AppResult<Account> {
    let (id, user_id, funds, currency, created_on) = row;

    let funds = Funds::new(funds)
        .map_err(|e| AppError::Internal(format!("Corrupt funds for account {id}: {e}")))?;
    let currency = currency
        .parse()
        .map_err(|e| AppError::Internal(format!("Corrupt currency for account {id}: {e}")))?;

    Ok(Account {
        id,
        user_id,
        funds,
        currency,
        created_on,
    })
}

/// Account Ledger over the backing store.
#[derive(Debug, Clone)]
pub struct AccountLedger {
    pool: PgPool,
}

impl AccountLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read an account on the caller's connection.
    pub(crate) async fn fetch(
        conn: &mut PgConnection,
        id: AccountId,
    ) -> AppResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, user_id, funds, currency, created_on FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        row.map(account_from_row).transpose()
    }

    /// Read an account and take its row lock. Must run inside the caller's
    /// transaction; the lock is what serializes concurrent balance checks.
    pub(crate) async fn fetch_for_update(
        conn: &mut PgConnection,
        id: AccountId,
    ) -> AppResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, user_id, funds, currency, created_on FROM accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        row.map(account_from_row).transpose()
    }

    /// Persist a new funds value on the caller's connection.
    pub(crate) async fn store_funds(
        conn: &mut PgConnection,
        id: AccountId,
        funds: &Funds,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE accounts SET funds = $2 WHERE id = $1")
            .bind(id)
            .bind(funds.value())
            .execute(conn)
            .await?;

        if result.rows_affected() != 1 {
            return Err(AppError::Internal(format!(
                "Funds update touched {} rows for account {id}",
                result.rows_affected()
            )));
        }

        Ok(())
    }

    /// Existence check on the caller's connection.
    pub(crate) async fn exists(conn: &mut PgConnection, id: AccountId) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1)")
                .bind(id)
                .fetch_one(conn)
                .await?;

        Ok(exists)
    }

    /// Resolve the owning user of an account, if the account exists.
    pub async fn owner_of(&self, id: AccountId) -> AppResult<Option<UserId>> {
        let owner: Option<UserId> =
            sqlx::query_scalar("SELECT user_id FROM accounts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(owner)
    }
}

#[async_trait]
impl AccountService for AccountLedger {
    async fn create(&self, _identity: &Identity, new: NewAccount) -> AppResult<Account> {
        let created_on = Utc::now().date_naive();

        let row: AccountRow = sqlx::query_as(
            r#"
            INSERT INTO accounts (user_id, funds, currency, created_on)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, funds, currency, created_on
            "#,
        )
        .bind(new.user_id)
        .bind(new.funds.value())
        .bind(new.currency.as_str())
        .bind(created_on)
        .fetch_one(&self.pool)
        .await?;

        let account = account_from_row(row)?;
        tracing::info!(account_id = account.id, user_id = account.user_id, "Account created");

        Ok(account)
    }

    async fn update_by_id(
        &self,
        _identity: &Identity,
        id: AccountId,
        update: AccountUpdate,
    ) -> AppResult<Account> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            UPDATE accounts
            SET funds = $2, currency = $3
            WHERE id = $1
            RETURNING id, user_id, funds, currency, created_on
            "#,
        )
        .bind(id)
        .bind(update.funds.value())
        .bind(update.currency.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(DomainError::AccountNotFound(id))?;
        account_from_row(row)
    }

    async fn delete_by_id(&self, _identity: &Identity, id: AccountId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AccountNotFound(id).into());
        }

        tracing::info!(account_id = id, "Account deleted");
        Ok(())
    }

    async fn get_by_id(&self, _identity: &Identity, id: AccountId) -> AppResult<Account> {
        let mut conn = self.pool.acquire().await?;

        Self::fetch(&mut conn, id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(id).into())
    }

    async fn get_by_user_id(
        &self,
        _identity: &Identity,
        user_id: UserId,
    ) -> AppResult<Vec<Account>> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            "SELECT id, user_id, funds, currency, created_on FROM accounts WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(account_from_row).collect()
    }

    async fn exists_by_id(&self, _identity: &Identity, id: AccountId) -> AppResult<bool> {
        let mut conn = self.pool.acquire().await?;

        Self::exists(&mut conn, id).await
    }
}
