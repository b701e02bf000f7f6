//! Caller identity and role grants
//!
//! The acting identity is resolved once per request by the auth middleware
//! and threaded explicitly through every service call. It is never mutated
//! mid-request.

use std::fmt;
use std::str::FromStr;

use super::UserId;

/// Resource classes grants are expressed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Account,
    Operation,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Account => "account",
            Resource::Operation => "operation",
        }
    }
}

/// What a grant permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    View,
    Edit,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::View => "view",
            Access::Edit => "edit",
        }
    }
}

/// Whose resources a grant covers: the caller's own, or anyone's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Own,
    Any,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Own => "self",
            Scope::Any => "any",
        }
    }
}

/// A single role grant, e.g. `account:edit:any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grant {
    pub resource: Resource,
    pub access: Access,
    pub scope: Scope,
}

impl Grant {
    pub fn new(resource: Resource, access: Access, scope: Scope) -> Self {
        Self {
            resource,
            access,
            scope,
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.resource.as_str(),
            self.access.as_str(),
            self.scope.as_str()
        )
    }
}

/// Error for grant strings that do not match `resource:access:scope`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid grant: {0}")]
pub struct InvalidGrant(pub String);

impl FromStr for Grant {
    type Err = InvalidGrant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (resource, access, scope) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(r), Some(a), Some(sc), None) => (r, a, sc),
            _ => return Err(InvalidGrant(s.to_string())),
        };

        let resource = match resource {
            "account" => Resource::Account,
            "operation" => Resource::Operation,
            _ => return Err(InvalidGrant(s.to_string())),
        };
        let access = match access {
            "view" => Access::View,
            "edit" => Access::Edit,
            _ => return Err(InvalidGrant(s.to_string())),
        };
        let scope = match scope {
            "self" => Scope::Own,
            "any" => Scope::Any,
            _ => return Err(InvalidGrant(s.to_string())),
        };

        Ok(Grant::new(resource, access, scope))
    }
}

/// The acting caller: user id plus the role grants attached to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    grants: Vec<Grant>,
}

impl Identity {
    pub fn new(user_id: UserId, grants: Vec<Grant>) -> Self {
        Self { user_id, grants }
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    pub fn holds(&self, resource: Resource, access: Access, scope: Scope) -> bool {
        self.grants.contains(&Grant::new(resource, access, scope))
    }

    /// Whether the caller may view a resource owned by `owner`.
    pub fn may_view(&self, resource: Resource, owner: UserId) -> bool {
        self.holds(resource, Access::View, Scope::Any)
            || (owner == self.user_id && self.holds(resource, Access::View, Scope::Own))
    }

    /// Whether the caller may edit a resource owned by `owner`.
    pub fn may_edit(&self, resource: Resource, owner: UserId) -> bool {
        self.holds(resource, Access::Edit, Scope::Any)
            || (owner == self.user_id && self.holds(resource, Access::Edit, Scope::Own))
    }
}
