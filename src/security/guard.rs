//! Authorization proxy
//!
//! [`Secured<S>`] decorates a service with permission checks while keeping
//! its capability interface, so callers cannot tell proxy and real service
//! apart. Ownership of id-addressed resources is resolved through the
//! ledger first; an absent resource is `NotFound`, a failed permission
//! check is `AccessDenied` - both are rejections, but the taxonomy keeps
//! them distinct.

use async_trait::async_trait;

use crate::domain::{
    Access, Account, AccountId, AccountUpdate, DomainError, Identity, NewAccount, Operation,
    OperationId, Resource, Scope, UserId,
};
use crate::error::{AppError, AppResult};
use crate::ledger::{AccountLedger, AccountService};
use crate::processing::OperationService;

/// Transparent authorization decorator around a service.
#[derive(Clone)]
pub struct Secured<S> {
    inner: S,
    ledger: AccountLedger,
}

impl<S> Secured<S> {
    /// Wrap `inner`, resolving resource ownership through `ledger`.
    pub fn new(inner: S, ledger: AccountLedger) -> Self {
        Self { inner, ledger }
    }

    fn deny(identity: &Identity, action: &str) -> AppError {
        tracing::warn!(user_id = identity.user_id, action, "Access denied");
        AppError::AccessDenied
    }

    /// Owner of the account, or `NotFound` if the account is absent.
    async fn account_owner(&self, id: AccountId) -> AppResult<UserId> {
        self.ledger
            .owner_of(id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(id).into())
    }
}

#[async_trait]
impl<S: AccountService> AccountService for Secured<S> {
    async fn create(&self, identity: &Identity, new: NewAccount) -> AppResult<Account> {
        if !identity.may_edit(Resource::Account, new.user_id) {
            return Err(Self::deny(identity, "account.create"));
        }
        self.inner.create(identity, new).await
    }

    async fn update_by_id(
        &self,
        identity: &Identity,
        id: AccountId,
        update: AccountUpdate,
    ) -> AppResult<Account> {
        let owner = self.account_owner(id).await?;
        if !identity.may_edit(Resource::Account, owner) {
            return Err(Self::deny(identity, "account.update"));
        }
        self.inner.update_by_id(identity, id, update).await
    }

    async fn delete_by_id(&self, identity: &Identity, id: AccountId) -> AppResult<()> {
        let owner = self.account_owner(id).await?;
        if !identity.may_edit(Resource::Account, owner) {
            return Err(Self::deny(identity, "account.delete"));
        }
        self.inner.delete_by_id(identity, id).await
    }

    async fn get_by_id(&self, identity: &Identity, id: AccountId) -> AppResult<Account> {
        let owner = self.account_owner(id).await?;
        if !identity.may_view(Resource::Account, owner) {
            return Err(Self::deny(identity, "account.get"));
        }
        self.inner.get_by_id(identity, id).await
    }

    async fn get_by_user_id(
        &self,
        identity: &Identity,
        user_id: UserId,
    ) -> AppResult<Vec<Account>> {
        if !identity.may_view(Resource::Account, user_id) {
            return Err(Self::deny(identity, "account.list"));
        }
        self.inner.get_by_user_id(identity, user_id).await
    }

    async fn exists_by_id(&self, identity: &Identity, id: AccountId) -> AppResult<bool> {
        // An absent account has no owner to protect.
        match self.ledger.owner_of(id).await? {
            None => Ok(false),
            Some(owner) => {
                if !identity.may_view(Resource::Account, owner) {
                    return Err(Self::deny(identity, "account.exists"));
                }
                self.inner.exists_by_id(identity, id).await
            }
        }
    }
}

#[async_trait]
impl<S: OperationService> OperationService for Secured<S> {
    type Request = S::Request;

    async fn process(&self, identity: &Identity, request: Self::Request) -> AppResult<Operation> {
        use crate::processing::AccountScoped;

        let owner = self.account_owner(request.account_id()).await?;
        if !identity.may_edit(Resource::Operation, owner) {
            return Err(Self::deny(identity, "operation.process"));
        }
        self.inner.process(identity, request).await
    }

    async fn get_by_id(&self, identity: &Identity, id: OperationId) -> AppResult<Operation> {
        let operation = self.inner.get_by_id(identity, id).await?;

        // A transfer is visible to either side.
        let involved = operation.user_id == identity.user_id
            || operation.to_user_id == Some(identity.user_id);
        let allowed = identity.holds(Resource::Operation, Access::View, Scope::Any)
            || (involved && identity.holds(Resource::Operation, Access::View, Scope::Own));
        if !allowed {
            return Err(Self::deny(identity, "operation.get"));
        }

        Ok(operation)
    }

    async fn get_by_account_id(
        &self,
        identity: &Identity,
        account_id: AccountId,
    ) -> AppResult<Vec<Operation>> {
        let owner = self.account_owner(account_id).await?;
        if !identity.may_view(Resource::Operation, owner) {
            return Err(Self::deny(identity, "operation.list_by_account"));
        }
        self.inner.get_by_account_id(identity, account_id).await
    }

    async fn get_by_user_id(
        &self,
        identity: &Identity,
        user_id: UserId,
    ) -> AppResult<Vec<Operation>> {
        if !identity.may_view(Resource::Operation, user_id) {
            return Err(Self::deny(identity, "operation.list_by_user"));
        }
        self.inner.get_by_user_id(identity, user_id).await
    }
}
