//! Account ledger integration tests
//!
//! CRUD behavior and the authorization rules enforced by the proxy in
//! front of the ledger.

use rust_decimal_macros::dec;

use moneta::domain::{AccountUpdate, DomainError, Funds, NewAccount};
use moneta::error::AppError;
use moneta::ledger::{AccountLedger, AccountService};
use moneta::security::Secured;

mod common;

use common::{identity, seed_account, seed_user, setup_test_db, ADMIN_GRANTS, SELF_GRANTS};

fn secured_accounts(pool: &sqlx::PgPool) -> Secured<AccountLedger> {
    let ledger = AccountLedger::new(pool.clone());
    Secured::new(ledger.clone(), ledger)
}

#[tokio::test]
async fn test_account_crud_roundtrip() {
    let pool = setup_test_db().await;
    let user_id = seed_user(&pool, "crud_user", SELF_GRANTS).await;
    let accounts = secured_accounts(&pool);
    let caller = identity(user_id, SELF_GRANTS);

    let account = accounts
        .create(
            &caller,
            NewAccount {
                user_id,
                funds: Funds::new(dec!(100)).unwrap(),
                currency: "USD".parse().unwrap(),
            },
        )
        .await
        .expect("Create failed");

    assert_eq!(account.user_id, user_id);
    assert_eq!(account.funds.value(), dec!(100));
    assert_eq!(account.currency.as_str(), "USD");

    let fetched = accounts.get_by_id(&caller, account.id).await.unwrap();
    assert_eq!(fetched, account);
    assert!(accounts.exists_by_id(&caller, account.id).await.unwrap());

    let updated = accounts
        .update_by_id(
            &caller,
            account.id,
            AccountUpdate {
                funds: Funds::new(dec!(250.5)).unwrap(),
                currency: "EUR".parse().unwrap(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.funds.value(), dec!(250.5));
    assert_eq!(updated.currency.as_str(), "EUR");

    let listed = accounts.get_by_user_id(&caller, user_id).await.unwrap();
    assert_eq!(listed, vec![updated]);

    accounts.delete_by_id(&caller, account.id).await.unwrap();

    let err = accounts.get_by_id(&caller, account.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::AccountNotFound(_))
    ));
    assert!(!accounts.exists_by_id(&caller, account.id).await.unwrap());
}

#[tokio::test]
async fn test_foreign_account_requires_any_grants() {
    let pool = setup_test_db().await;
    let owner = seed_user(&pool, "acct_owner", SELF_GRANTS).await;
    let other = seed_user(&pool, "acct_other", SELF_GRANTS).await;
    let operator = seed_user(&pool, "acct_operator", ADMIN_GRANTS).await;
    let account_id = seed_account(&pool, owner, dec!(10), "USD").await;

    let accounts = secured_accounts(&pool);

    // A non-owner with only self grants is rejected on every path.
    let outsider = identity(other, SELF_GRANTS);
    assert!(matches!(
        accounts.get_by_id(&outsider, account_id).await.unwrap_err(),
        AppError::AccessDenied
    ));
    assert!(matches!(
        accounts
            .get_by_user_id(&outsider, owner)
            .await
            .unwrap_err(),
        AppError::AccessDenied
    ));
    assert!(matches!(
        accounts
            .exists_by_id(&outsider, account_id)
            .await
            .unwrap_err(),
        AppError::AccessDenied
    ));
    assert!(matches!(
        accounts
            .delete_by_id(&outsider, account_id)
            .await
            .unwrap_err(),
        AppError::AccessDenied
    ));

    // The any-scoped operator passes the same checks.
    let admin = identity(operator, ADMIN_GRANTS);
    let account = accounts.get_by_id(&admin, account_id).await.unwrap();
    assert_eq!(account.user_id, owner);

    let listed = accounts.get_by_user_id(&admin, owner).await.unwrap();
    assert_eq!(listed.len(), 1);

    // Including creating an account on someone else's behalf.
    let created = accounts
        .create(
            &admin,
            NewAccount {
                user_id: owner,
                funds: Funds::zero(),
                currency: "RUB".parse().unwrap(),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.user_id, owner);
}

#[tokio::test]
async fn test_owner_without_grants_is_denied() {
    let pool = setup_test_db().await;
    let user_id = seed_user(&pool, "grantless", &[]).await;
    let account_id = seed_account(&pool, user_id, dec!(10), "USD").await;

    let accounts = secured_accounts(&pool);
    let caller = identity(user_id, &[]);

    assert!(matches!(
        accounts.get_by_id(&caller, account_id).await.unwrap_err(),
        AppError::AccessDenied
    ));
}

#[tokio::test]
async fn test_missing_account_is_not_found_not_denied() {
    let pool = setup_test_db().await;
    let operator = seed_user(&pool, "nf_operator", ADMIN_GRANTS).await;

    let accounts = secured_accounts(&pool);
    let admin = identity(operator, ADMIN_GRANTS);

    let err = accounts
        .update_by_id(
            &admin,
            i64::MAX,
            AccountUpdate {
                funds: Funds::zero(),
                currency: "USD".parse().unwrap(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::AccountNotFound(_))
    ));

    let err = accounts.delete_by_id(&admin, i64::MAX).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::AccountNotFound(_))
    ));

    // Existence checks on absent ids answer false for any caller.
    assert!(!accounts.exists_by_id(&admin, i64::MAX).await.unwrap());
}

#[tokio::test]
async fn test_list_for_user_without_accounts_is_empty() {
    let pool = setup_test_db().await;
    let user_id = seed_user(&pool, "no_accounts", SELF_GRANTS).await;

    let accounts = secured_accounts(&pool);
    let listed = accounts
        .get_by_user_id(&identity(user_id, SELF_GRANTS), user_id)
        .await
        .unwrap();

    assert!(listed.is_empty());
}
