//! Operation processors
//!
//! One processor per operation kind. Each `process` call executes its
//! read-modify-write sequence (load accounts, convert, mutate funds,
//! append the operation record) as a single database transaction; any
//! failure after `begin` drops the transaction and no partial mutation is
//! observable.

mod replenishment;
mod transfer;
mod withdrawal;

use async_trait::async_trait;

use crate::domain::{AccountId, Identity, Operation, OperationId, UserId};
use crate::error::AppResult;

pub use replenishment::{ReplenishmentProcessor, ReplenishmentRequest};
pub use transfer::{TransferProcessor, TransferRequest};
pub use withdrawal::{WithdrawalProcessor, WithdrawalRequest};

/// The account a request acts on. The authorization proxy resolves its
/// owner before the processor runs.
pub trait AccountScoped {
    fn account_id(&self) -> AccountId;
}

/// Capability interface shared by the three processors and their
/// authorization proxies.
#[async_trait]
pub trait OperationService: Send + Sync {
    type Request: AccountScoped + Send + Sync;

    /// Apply the operation and append its record. Returns the persisted
    /// record.
    async fn process(&self, identity: &Identity, request: Self::Request) -> AppResult<Operation>;

    async fn get_by_id(&self, identity: &Identity, id: OperationId) -> AppResult<Operation>;

    async fn get_by_account_id(
        &self,
        identity: &Identity,
        account_id: AccountId,
    ) -> AppResult<Vec<Operation>>;

    async fn get_by_user_id(
        &self,
        identity: &Identity,
        user_id: UserId,
    ) -> AppResult<Vec<Operation>>;
}
