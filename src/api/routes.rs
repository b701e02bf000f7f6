//! API Routes
//!
//! HTTP endpoint definitions. Handlers are a thin skin: parse, call the
//! proxied service, serialize. All business rules live behind the service
//! traits.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Account, AccountUpdate, Amount, Currency, Funds, Identity, NewAccount, Operation,
};
use crate::error::AppError;
use crate::ledger::AccountService;
use crate::processing::{
    OperationService, ReplenishmentRequest, TransferRequest, WithdrawalRequest,
};

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub user_id: i64,
    pub funds: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub funds: String,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub user_id: i64,
    pub funds: Decimal,
    pub currency: String,
    pub created_on: NaiveDate,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            user_id: account.user_id,
            funds: account.funds.value(),
            currency: account.currency.as_str().to_string(),
            created_on: account.created_on,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReplenishRequest {
    pub account_id: i64,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub account_id: i64,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequestBody {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: String,
    /// Accepted for compatibility; the source account's currency wins.
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub id: i64,
    pub kind: String,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_user_id: Option<i64>,
    pub account_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<i64>,
    pub amount: Decimal,
    pub currency: String,
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Operation> for OperationResponse {
    fn from(operation: Operation) -> Self {
        Self {
            id: operation.id,
            kind: operation.kind.as_str().to_string(),
            user_id: operation.user_id,
            to_user_id: operation.to_user_id,
            account_id: operation.account_id,
            to_account_id: operation.to_account_id,
            amount: operation.amount,
            currency: operation.currency.as_str().to_string(),
            rate: operation.rate,
            created_at: operation.created_at,
        }
    }
}

fn parse_amount(raw: &str) -> Result<Amount, AppError> {
    raw.parse::<Amount>().map_err(AppError::from)
}

fn parse_funds(raw: &str) -> Result<Funds, AppError> {
    raw.parse::<Funds>().map_err(AppError::from)
}

fn parse_currency(raw: &str) -> Result<Currency, AppError> {
    raw.parse::<Currency>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/accounts", post(create_account))
        .route("/accounts/:account_id", get(get_account))
        .route("/accounts/:account_id", patch(update_account))
        .route("/accounts/:account_id", delete(delete_account))
        .route("/accounts/:account_id/exists", get(account_exists))
        .route("/users/:user_id/accounts", get(get_user_accounts))
        // Replenishments
        .route("/replenishments", post(replenish))
        .route("/replenishments/:operation_id", get(get_replenishment))
        .route(
            "/accounts/:account_id/replenishments",
            get(get_account_replenishments),
        )
        .route(
            "/users/:user_id/replenishments",
            get(get_user_replenishments),
        )
        // Withdrawals
        .route("/withdrawals", post(withdraw))
        .route("/withdrawals/:operation_id", get(get_withdrawal))
        .route(
            "/accounts/:account_id/withdrawals",
            get(get_account_withdrawals),
        )
        .route("/users/:user_id/withdrawals", get(get_user_withdrawals))
        // Transfers
        .route("/transfers", post(transfer))
        .route("/transfers/:operation_id", get(get_transfer))
        .route("/accounts/:account_id/transfers", get(get_account_transfers))
        .route("/users/:user_id/transfers", get(get_user_transfers))
}

// =========================================================================
// Account endpoints
// =========================================================================

async fn create_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let new = NewAccount {
        user_id: request.user_id,
        funds: parse_funds(&request.funds)?,
        currency: parse_currency(&request.currency)?,
    };

    let account = state.accounts.create(&identity, new).await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

async fn get_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state.accounts.get_by_id(&identity, account_id).await?;

    Ok(Json(account.into()))
}

async fn update_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(account_id): Path<i64>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let update = AccountUpdate {
        funds: parse_funds(&request.funds)?,
        currency: parse_currency(&request.currency)?,
    };

    let account = state
        .accounts
        .update_by_id(&identity, account_id, update)
        .await?;

    Ok(Json(account.into()))
}

async fn delete_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(account_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.accounts.delete_by_id(&identity, account_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn account_exists(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(account_id): Path<i64>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = state.accounts.exists_by_id(&identity, account_id).await?;

    Ok(Json(ExistsResponse { exists }))
}

async fn get_user_accounts(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = state.accounts.get_by_user_id(&identity, user_id).await?;

    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

// =========================================================================
// Replenishment endpoints
// =========================================================================

async fn replenish(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<ReplenishRequest>,
) -> Result<(StatusCode, Json<OperationResponse>), AppError> {
    let request = ReplenishmentRequest {
        account_id: request.account_id,
        amount: parse_amount(&request.amount)?,
        currency: parse_currency(&request.currency)?,
    };

    let operation = state.replenishments.process(&identity, request).await?;

    Ok((StatusCode::CREATED, Json(operation.into())))
}

async fn get_replenishment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(operation_id): Path<i64>,
) -> Result<Json<OperationResponse>, AppError> {
    let operation = state
        .replenishments
        .get_by_id(&identity, operation_id)
        .await?;

    Ok(Json(operation.into()))
}

async fn get_account_replenishments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(account_id): Path<i64>,
) -> Result<Json<Vec<OperationResponse>>, AppError> {
    let operations = state
        .replenishments
        .get_by_account_id(&identity, account_id)
        .await?;

    Ok(Json(operations.into_iter().map(Into::into).collect()))
}

async fn get_user_replenishments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<OperationResponse>>, AppError> {
    let operations = state
        .replenishments
        .get_by_user_id(&identity, user_id)
        .await?;

    Ok(Json(operations.into_iter().map(Into::into).collect()))
}

// =========================================================================
// Withdrawal endpoints
// =========================================================================

async fn withdraw(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<WithdrawRequest>,
) -> Result<(StatusCode, Json<OperationResponse>), AppError> {
    let request = WithdrawalRequest {
        account_id: request.account_id,
        amount: parse_amount(&request.amount)?,
        currency: parse_currency(&request.currency)?,
    };

    let operation = state.withdrawals.process(&identity, request).await?;

    Ok((StatusCode::CREATED, Json(operation.into())))
}

async fn get_withdrawal(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(operation_id): Path<i64>,
) -> Result<Json<OperationResponse>, AppError> {
    let operation = state.withdrawals.get_by_id(&identity, operation_id).await?;

    Ok(Json(operation.into()))
}

async fn get_account_withdrawals(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(account_id): Path<i64>,
) -> Result<Json<Vec<OperationResponse>>, AppError> {
    let operations = state
        .withdrawals
        .get_by_account_id(&identity, account_id)
        .await?;

    Ok(Json(operations.into_iter().map(Into::into).collect()))
}

async fn get_user_withdrawals(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<OperationResponse>>, AppError> {
    let operations = state
        .withdrawals
        .get_by_user_id(&identity, user_id)
        .await?;

    Ok(Json(operations.into_iter().map(Into::into).collect()))
}

// =========================================================================
// Transfer endpoints
// =========================================================================

async fn transfer(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<TransferRequestBody>,
) -> Result<(StatusCode, Json<OperationResponse>), AppError> {
    let currency = match request.currency.as_deref() {
        Some(raw) => Some(parse_currency(raw)?),
        None => None,
    };

    let request = TransferRequest {
        from_account_id: request.from_account_id,
        to_account_id: request.to_account_id,
        amount: parse_amount(&request.amount)?,
        currency,
    };

    let operation = state.transfers.process(&identity, request).await?;

    Ok((StatusCode::CREATED, Json(operation.into())))
}

async fn get_transfer(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(operation_id): Path<i64>,
) -> Result<Json<OperationResponse>, AppError> {
    let operation = state.transfers.get_by_id(&identity, operation_id).await?;

    Ok(Json(operation.into()))
}

async fn get_account_transfers(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(account_id): Path<i64>,
) -> Result<Json<Vec<OperationResponse>>, AppError> {
    let operations = state
        .transfers
        .get_by_account_id(&identity, account_id)
        .await?;

    Ok(Json(operations.into_iter().map(Into::into).collect()))
}

async fn get_user_transfers(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<OperationResponse>>, AppError> {
    let operations = state.transfers.get_by_user_id(&identity, user_id).await?;

    Ok(Json(operations.into_iter().map(Into::into).collect()))
}
