//! Principals and the policy requirements attached to request types.

use std::collections::BTreeSet;

use common::UserId;

/// Permission claim values.
pub mod permissions {
    pub const WRITE_TODO: &str = "WriteTodo";
    pub const DELETE_TODO: &str = "DeleteTodo";
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    permissions: BTreeSet<String>,
}

impl Principal {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            permissions: BTreeSet::new(),
        }
    }

    /// Adds a permission claim.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }
}

/// A named requirement a principal must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub name: &'static str,
    pub required_permission: &'static str,
}

impl Policy {
    /// Create, update, and complete todo items and lists.
    pub const TODO_WRITE_ACCESS: Policy = Policy {
        name: "TodoWriteAccess",
        required_permission: permissions::WRITE_TODO,
    };

    /// Delete todo items.
    pub const TODO_DELETE_ACCESS: Policy = Policy {
        name: "TodoDeleteAccess",
        required_permission: permissions::DELETE_TODO,
    };

    pub fn is_satisfied_by(&self, principal: Option<&Principal>) -> bool {
        principal.is_some_and(|p| p.has_permission(self.required_permission))
    }
}
