//! Common test utilities
//!
//! Live-database harness plus fixtures: seeded users/accounts/API keys, a
//! fixed-quote oracle and ready-made identities. Each test creates its own
//! users and accounts, so tests stay independent under parallel execution.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;

use moneta::domain::{Currency, Identity};
use moneta::rates::{CurrencyConverter, RateError, RateOracle};

/// Grants a regular account holder carries.
pub const SELF_GRANTS: &[&str] = &[
    "account:view:self",
    "account:edit:self",
    "operation:view:self",
    "operation:edit:self",
];

/// Grants for an operator that may act on anyone's resources.
pub const ADMIN_GRANTS: &[&str] = &[
    "account:view:any",
    "account:edit:any",
    "operation:view:any",
    "operation:edit:any",
];

static CLEANED: OnceCell<()> = OnceCell::const_new();

/// Connect to the test database. The first caller per test binary wipes
/// the tables once; afterwards tests only ever touch their own rows.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    CLEANED
        .get_or_init(|| async {
            sqlx::query("TRUNCATE TABLE operations, accounts, api_keys, users CASCADE")
                .execute(&pool)
                .await
                .expect("Failed to clean up DB");
        })
        .await;

    pool
}

pub async fn seed_user(pool: &PgPool, name: &str, grants: &[&str]) -> i64 {
    let grants: Vec<String> = grants.iter().map(|g| g.to_string()).collect();

    sqlx::query_scalar("INSERT INTO users (name, grants) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(&grants)
        .fetch_one(pool)
        .await
        .expect("Failed to seed user")
}

pub async fn seed_account(pool: &PgPool, user_id: i64, funds: Decimal, currency: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO accounts (user_id, funds, currency) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(funds)
    .bind(currency)
    .fetch_one(pool)
    .await
    .expect("Failed to seed account")
}

/// Seed an API key for `user_id`, hashed the way the auth middleware
/// expects. Uses the database's sha256 so the test stays honest about the
/// stored format.
pub async fn seed_api_key(pool: &PgPool, user_id: i64, key: &str) {
    sqlx::query(
        r#"
        INSERT INTO api_keys (user_id, name, key_hash)
        VALUES ($1, $2, encode(sha256($3::bytea), 'hex'))
        "#,
    )
    .bind(user_id)
    .bind(format!("test key for user {user_id}"))
    .bind(key.as_bytes())
    .execute(pool)
    .await
    .expect("Failed to seed API key");
}

/// Build an identity with the given grant strings.
pub fn identity(user_id: i64, grants: &[&str]) -> Identity {
    Identity::new(
        user_id,
        grants.iter().map(|g| g.parse().unwrap()).collect(),
    )
}

/// Oracle returning a fixed quote table: RUB 1, USD 90, EUR 100.
/// USD -> EUR therefore converts at exactly 0.9.
pub struct FixedOracle {
    quotes: HashMap<Currency, Decimal>,
}

impl FixedOracle {
    pub fn standard() -> Self {
        Self {
            quotes: [
                (Currency::Rub, dec!(1)),
                (Currency::Usd, dec!(90)),
                (Currency::Eur, dec!(100)),
            ]
            .into_iter()
            .collect(),
        }
    }
}

#[async_trait]
impl RateOracle for FixedOracle {
    async fn quotes(&self) -> Result<HashMap<Currency, Decimal>, RateError> {
        Ok(self.quotes.clone())
    }
}

pub fn test_converter() -> CurrencyConverter {
    CurrencyConverter::new(Arc::new(FixedOracle::standard()))
}

pub async fn account_funds(pool: &PgPool, account_id: i64) -> Decimal {
    sqlx::query_scalar("SELECT funds FROM accounts WHERE id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read account funds")
}

pub async fn operation_count(pool: &PgPool, account_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM operations WHERE account_id = $1 OR to_account_id = $1",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await
    .expect("Failed to count operations")
}
