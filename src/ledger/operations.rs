//! Operation history store
//!
//! Append-only persistence for operation records. Rows are inserted inside
//! the processor's transaction and never updated afterwards; the history is
//! the audit trail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::domain::{
    AccountId, DomainError, NewOperation, Operation, OperationId, OperationKind, UserId,
};
use crate::error::{AppError, AppResult};

type OperationRow = (
    i64,
    String,
    i64,
    Option<i64>,
    i64,
    Option<i64>,
    Decimal,
    String,
    Decimal,
    DateTime<Utc>,
);

fn operation_from_row(row: OperationRow) -> AppResult<Operation> {
    let (id, kind, user_id, to_user_id, account_id, to_account_id, amount, currency, rate, created_at) =
        row;

    let kind = kind
        .parse()
        .map_err(|e| AppError::Internal(format!("Corrupt kind for operation {id}: {e}")))?;
    let currency = currency
        .parse()
        .map_err(|e| AppError::Internal(format!("Corrupt currency for operation {id}: {e}")))?;

    Ok(Operation {
        id,
        kind,
        user_id,
        to_user_id,
        account_id,
        to_account_id,
        amount,
        currency,
        rate,
        created_at,
    })
}

#[derive(Debug, Clone)]
pub struct OperationStore {
    pool: PgPool,
}

impl OperationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a record on the caller's connection, stamped with a fresh
    /// timestamp. The caller's transaction makes it atomic with the
    /// balance mutation it documents.
    pub(crate) async fn insert(
        conn: &mut PgConnection,
        new: &NewOperation,
    ) -> AppResult<Operation> {
        let row: OperationRow = sqlx::query_as(
            r#"
            INSERT INTO operations (
                kind, user_id, to_user_id, account_id, to_account_id,
                amount, currency, rate, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, kind, user_id, to_user_id, account_id, to_account_id,
                      amount, currency, rate, created_at
            "#,
        )
        .bind(new.kind.as_str())
        .bind(new.user_id)
        .bind(new.to_user_id)
        .bind(new.account_id)
        .bind(new.to_account_id)
        .bind(new.amount)
        .bind(new.currency.as_str())
        .bind(new.rate)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        operation_from_row(row)
    }

    /// Look up one record of the given kind. Ids of a different kind are
    /// reported as absent.
    pub async fn get_by_id(&self, kind: OperationKind, id: OperationId) -> AppResult<Operation> {
        let row: Option<OperationRow> = sqlx::query_as(
            r#"
            SELECT id, kind, user_id, to_user_id, account_id, to_account_id,
                   amount, currency, rate, created_at
            FROM operations
            WHERE id = $1 AND kind = $2
            "#,
        )
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(DomainError::OperationNotFound(id))?;
        operation_from_row(row)
    }

    /// All records of the given kind touching an account. Transfers match
    /// on either endpoint.
    pub async fn get_by_account_id(
        &self,
        kind: OperationKind,
        account_id: AccountId,
    ) -> AppResult<Vec<Operation>> {
        let rows: Vec<OperationRow> = sqlx::query_as(
            r#"
            SELECT id, kind, user_id, to_user_id, account_id, to_account_id,
                   amount, currency, rate, created_at
            FROM operations
            WHERE kind = $1 AND (account_id = $2 OR to_account_id = $2)
            ORDER BY id
            "#,
        )
        .bind(kind.as_str())
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(operation_from_row).collect()
    }

    /// All records of the given kind involving a user. Transfers match on
    /// either side.
    pub async fn get_by_user_id(
        &self,
        kind: OperationKind,
        user_id: UserId,
    ) -> AppResult<Vec<Operation>> {
        let rows: Vec<OperationRow> = sqlx::query_as(
            r#"
            SELECT id, kind, user_id, to_user_id, account_id, to_account_id,
                   amount, currency, rate, created_at
            FROM operations
            WHERE kind = $1 AND (user_id = $2 OR to_user_id = $2)
            ORDER BY id
            "#,
        )
        .bind(kind.as_str())
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(operation_from_row).collect()
    }
}
