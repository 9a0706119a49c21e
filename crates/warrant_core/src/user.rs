//! The user capability.
//!
//! Accounts belong to the host application; this crate only reads them.

use crate::id::UserId;
use crate::permission::PermissionId;
use std::collections::BTreeSet;

/// Read-only view of an account
pub trait User: Send + Sync {
    /// Primary key, `None` for anonymous users
    fn id(&self) -> Option<UserId>;

    /// Superusers bypass every policy
    fn is_superuser(&self) -> bool;

    /// Inactive users hold no permissions
    fn is_active(&self) -> bool;

    /// Whether this is the anonymous user
    fn is_anonymous(&self) -> bool {
        self.id().is_none()
    }

    /// Whether this user has authenticated
    fn is_authenticated(&self) -> bool {
        !self.is_anonymous()
    }

    /// Permissions granted to the user directly
    fn user_permissions(&self) -> BTreeSet<PermissionId>;

    /// Permissions granted through the user's groups
    fn group_permissions(&self) -> BTreeSet<PermissionId>;
}

/// The unauthenticated visitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnonymousUser;

impl User for AnonymousUser {
    fn id(&self) -> Option<UserId> {
        None
    }

    fn is_superuser(&self) -> bool {
        false
    }

    fn is_active(&self) -> bool {
        false
    }

    fn user_permissions(&self) -> BTreeSet<PermissionId> {
        BTreeSet::new()
    }

    fn group_permissions(&self) -> BTreeSet<PermissionId> {
        BTreeSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_user() {
        let user = AnonymousUser;
        assert!(user.is_anonymous());
        assert!(!user.is_authenticated());
        assert!(!user.is_superuser());
        assert!(user.user_permissions().is_empty());
    }
}
