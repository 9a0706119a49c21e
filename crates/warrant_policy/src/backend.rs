//! Authorization backends.
//!
//! A backend answers model-level questions ("may this user change posts?")
//! and, when it is also a [`FilterBackend`], produces the filter for a list
//! view. [`PolicyBackend`] adds the registry's object-level policies on top of
//! the model-level answer.

use crate::cache::PermissionCache;
use crate::registry::PolicyRegistry;
use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;
use warrant_core::{PermissionId, Q, User};

/// One link in the authorization chain
pub trait PermissionBackend: Send + Sync {
    /// Name used in settings and logs
    fn name(&self) -> &str;

    /// Every permission the backend grants the user
    fn get_all_permissions(
        &self,
        user: &dyn User,
        cache: &PermissionCache,
    ) -> Arc<BTreeSet<PermissionId>>;

    /// Whether the backend grants `permission`, on `obj` when given
    fn has_perm(
        &self,
        user: &dyn User,
        permission: &PermissionId,
        obj: Option<&dyn Any>,
        cache: &PermissionCache,
    ) -> bool;
}

/// A backend that can narrow list views
pub trait FilterBackend: PermissionBackend {
    /// Filter for rows the user may act on under every permission listed
    fn get_filter(&self, user: &dyn User, permissions: &[PermissionId], cache: &PermissionCache)
    -> Q;
}

/// Model-level permissions from the user's direct and group grants
///
/// Inactive users are never granted anything; no object-level rules apply,
/// so any check against a concrete object is denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBackend;

impl ModelBackend {
    /// Create the backend
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Model-level check ignoring any object
    #[must_use]
    pub fn has_model_perm(
        &self,
        user: &dyn User,
        permission: &PermissionId,
        cache: &PermissionCache,
    ) -> bool {
        if !user.is_active() {
            return false;
        }
        user.is_superuser() || self.get_all_permissions(user, cache).contains(permission)
    }
}

impl PermissionBackend for ModelBackend {
    fn name(&self) -> &str {
        "model"
    }

    fn get_all_permissions(
        &self,
        user: &dyn User,
        cache: &PermissionCache,
    ) -> Arc<BTreeSet<PermissionId>> {
        let id = match user.id() {
            Some(id) if user.is_active() && !user.is_anonymous() => id,
            _ => return Arc::new(BTreeSet::new()),
        };
        cache.get_or_compute(id, || {
            let mut all = user.user_permissions();
            all.extend(user.group_permissions());
            all
        })
    }

    fn has_perm(
        &self,
        user: &dyn User,
        permission: &PermissionId,
        obj: Option<&dyn Any>,
        cache: &PermissionCache,
    ) -> bool {
        obj.is_none() && self.has_model_perm(user, permission, cache)
    }
}

/// Policy-aware backend
///
/// Without an object it behaves like [`ModelBackend`]; with one it also
/// requires the registered policy to agree.
#[derive(Debug, Clone)]
pub struct PolicyBackend {
    base: ModelBackend,
    registry: Arc<PolicyRegistry>,
}

impl PolicyBackend {
    /// Create a backend over a built registry
    #[must_use]
    pub fn new(registry: Arc<PolicyRegistry>) -> Self {
        Self {
            base: ModelBackend::new(),
            registry,
        }
    }

    /// Registry consulted for object-level checks
    #[must_use]
    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }
}

impl PermissionBackend for PolicyBackend {
    fn name(&self) -> &str {
        "policies"
    }

    fn get_all_permissions(
        &self,
        user: &dyn User,
        cache: &PermissionCache,
    ) -> Arc<BTreeSet<PermissionId>> {
        self.base.get_all_permissions(user, cache)
    }

    fn has_perm(
        &self,
        user: &dyn User,
        permission: &PermissionId,
        obj: Option<&dyn Any>,
        cache: &PermissionCache,
    ) -> bool {
        let model_level = self.base.has_model_perm(user, permission, cache);
        match obj {
            None => model_level,
            Some(obj) => model_level && self.registry.has_perm(user, permission, obj),
        }
    }
}

impl FilterBackend for PolicyBackend {
    fn get_filter(
        &self,
        user: &dyn User,
        permissions: &[PermissionId],
        cache: &PermissionCache,
    ) -> Q {
        let missing = permissions
            .iter()
            .find(|permission| !self.base.has_model_perm(user, permission, cache));
        if let Some(permission) = missing {
            tracing::debug!(%permission, "model permission missing, filtering out everything");
            return Q::none();
        }
        self.registry.get_filter(user, permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;
    use warrant_core::testing::{Post, TestUser};
    use warrant_core::{Action, AnonymousUser, UserId};

    struct AuthorPolicy;

    impl Policy<Post> for AuthorPolicy {
        fn has_perm(&self, user: &dyn User, obj: &Post) -> bool {
            user.id() == Some(obj.author)
        }

        fn get_filter(&self, user: &dyn User) -> Q {
            user.id().map_or(Q::none(), |id| Q::exact("author", id))
        }
    }

    fn perm(s: &str) -> PermissionId {
        PermissionId::parse(s).unwrap()
    }

    fn registry() -> Arc<PolicyRegistry> {
        let mut registry = PolicyRegistry::new();
        registry
            .register::<Post>(&[Action::View, Action::Change])
            .policy(AuthorPolicy)
            .unwrap();
        Arc::new(registry)
    }

    fn post(author: i64) -> Post {
        Post {
            id: 1,
            author: UserId::new(author),
            blog: 10,
            published: true,
        }
    }

    #[test]
    fn test_all_permissions_union() {
        let user = TestUser::new(1)
            .with_perm("blog.view_post")
            .with_group_perm("blog.change_post");
        let cache = PermissionCache::new();
        let all = ModelBackend.get_all_permissions(&user, &cache);
        assert_eq!(all.len(), 2);
        assert!(all.contains("blog.change_post"));
    }

    #[test]
    fn test_all_permissions_cached() {
        let user = TestUser::new(1).with_perm("blog.view_post");
        let cache = PermissionCache::new();
        ModelBackend.get_all_permissions(&user, &cache);
        ModelBackend.get_all_permissions(&user, &cache);
        assert_eq!(user.lookups(), 1);
    }

    #[test]
    fn test_all_permissions_inactive_or_anonymous() {
        let cache = PermissionCache::new();
        let inactive = TestUser::new(1).with_perm("blog.view_post").inactive();
        assert!(ModelBackend.get_all_permissions(&inactive, &cache).is_empty());
        assert!(ModelBackend.get_all_permissions(&AnonymousUser, &cache).is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_model_backend_denies_objects() {
        let user = TestUser::new(1).with_perm("blog.change_post");
        let cache = PermissionCache::new();
        let change = perm("blog.change_post");
        assert!(ModelBackend.has_perm(&user, &change, None, &cache));
        assert!(!ModelBackend.has_perm(&user, &change, Some(&post(1)), &cache));
    }

    #[test]
    fn test_policy_backend_without_object() {
        let backend = PolicyBackend::new(registry());
        let cache = PermissionCache::new();
        let user = TestUser::new(1).with_perm("blog.change_post");
        assert!(backend.has_perm(&user, &perm("blog.change_post"), None, &cache));
        assert!(!backend.has_perm(&user, &perm("blog.delete_post"), None, &cache));
    }

    #[test]
    fn test_policy_backend_with_object() {
        let backend = PolicyBackend::new(registry());
        let cache = PermissionCache::new();
        let change = perm("blog.change_post");
        let author = TestUser::new(1).with_perm("blog.change_post");
        let stranger = TestUser::new(2).with_perm("blog.change_post");
        let unprivileged = TestUser::new(1);

        assert!(backend.has_perm(&author, &change, Some(&post(1)), &cache));
        assert!(!backend.has_perm(&stranger, &change, Some(&post(1)), &cache));
        assert!(!backend.has_perm(&unprivileged, &change, Some(&post(1)), &cache));
    }

    #[test]
    fn test_policy_backend_unregistered_falls_back_to_model() {
        let backend = PolicyBackend::new(registry());
        let cache = PermissionCache::new();
        let user = TestUser::new(2).with_perm("blog.delete_post");
        assert!(backend.has_perm(&user, &perm("blog.delete_post"), Some(&post(1)), &cache));
    }

    #[test]
    fn test_get_filter_short_circuits() {
        let backend = PolicyBackend::new(registry());
        let cache = PermissionCache::new();
        let user = TestUser::new(1).with_perm("blog.view_post");
        let filter = backend.get_filter(
            &user,
            &[perm("blog.view_post"), perm("blog.change_post")],
            &cache,
        );
        assert!(filter.is_none());
    }

    #[test]
    fn test_get_filter_from_policies() {
        let backend = PolicyBackend::new(registry());
        let cache = PermissionCache::new();
        let user = TestUser::new(1)
            .with_perm("blog.view_post")
            .with_perm("blog.change_post");
        let filter = backend.get_filter(
            &user,
            &[perm("blog.view_post"), perm("blog.change_post")],
            &cache,
        );
        assert_eq!(filter, Q::exact("author", 1));
    }

    #[test]
    fn test_superuser_active_only() {
        let cache = PermissionCache::new();
        let change = perm("blog.change_post");
        let admin = TestUser::new(1).superuser();
        let retired = TestUser::new(2).superuser().inactive();
        assert!(ModelBackend.has_model_perm(&admin, &change, &cache));
        assert!(!ModelBackend.has_model_perm(&retired, &change, &cache));
    }
}
