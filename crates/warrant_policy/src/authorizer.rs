//! Backend chain and user-level entry points.

use crate::backend::{FilterBackend, ModelBackend, PermissionBackend, PolicyBackend};
use crate::cache::PermissionCache;
use crate::error::SettingsError;
use crate::registry::PolicyRegistry;
use crate::settings::{AuthSettings, BackendKind};
use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;
use warrant_core::{PermissionId, Q, User, UserId, conjunct};

/// Ordered chain of authorization backends
///
/// A permission is granted when any backend grants it. Only backends added
/// through [`AuthorizerBuilder::filter_backend`] contribute to
/// [`Authorizer::user_get_filter`].
pub struct Authorizer {
    backends: Vec<Arc<dyn PermissionBackend>>,
    filter_backends: Vec<Arc<dyn FilterBackend>>,
}

impl Authorizer {
    /// Start an empty chain
    #[must_use]
    pub fn builder() -> AuthorizerBuilder {
        AuthorizerBuilder::default()
    }

    /// Build the chain named by the settings
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownBackend`] if a backend name is unknown.
    pub fn from_settings(
        settings: &AuthSettings,
        registry: Arc<PolicyRegistry>,
    ) -> Result<Self, SettingsError> {
        let mut builder = Self::builder();
        for kind in settings.backend_kinds()? {
            builder = match kind {
                BackendKind::Model => builder.backend(ModelBackend::new()),
                BackendKind::Policies => {
                    builder.filter_backend(PolicyBackend::new(Arc::clone(&registry)))
                }
            };
        }
        Ok(builder.build())
    }

    /// Names of the backends, in order
    pub fn backend_names(&self) -> impl Iterator<Item = &str> {
        self.backends.iter().map(|backend| backend.name())
    }

    /// Union of the permissions every backend grants
    #[must_use]
    pub fn get_all_permissions(
        &self,
        user: &dyn User,
        cache: &PermissionCache,
    ) -> BTreeSet<PermissionId> {
        let mut all = BTreeSet::new();
        for backend in &self.backends {
            all.extend(backend.get_all_permissions(user, cache).iter().cloned());
        }
        all
    }

    /// Active superusers hold every permission; anyone else needs one backend
    /// to grant it
    #[must_use]
    pub fn has_perm(
        &self,
        user: &dyn User,
        permission: &PermissionId,
        obj: Option<&dyn Any>,
        cache: &PermissionCache,
    ) -> bool {
        if user.is_active() && user.is_superuser() {
            return true;
        }
        self.backends
            .iter()
            .any(|backend| backend.has_perm(user, permission, obj, cache))
    }

    /// Whether every permission is granted
    #[must_use]
    pub fn has_perms(
        &self,
        user: &dyn User,
        permissions: &[PermissionId],
        obj: Option<&dyn Any>,
        cache: &PermissionCache,
    ) -> bool {
        permissions
            .iter()
            .all(|permission| self.has_perm(user, permission, obj, cache))
    }

    /// Filter for rows the user may act on under every permission listed
    ///
    /// A user missing any of the model-level permissions gets `Q::none()`.
    /// Otherwise the filters of all filter-capable backends are ANDed.
    #[must_use]
    pub fn user_get_filter(
        &self,
        user: &dyn User,
        permissions: &[PermissionId],
        cache: &PermissionCache,
    ) -> Q {
        if !self.has_perms(user, permissions, None, cache) {
            tracing::debug!(?permissions, "user lacks model permissions");
            return Q::none();
        }
        conjunct(
            self.filter_backends
                .iter()
                .map(|backend| backend.get_filter(user, permissions, cache)),
        )
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("backends", &self.backend_names().collect::<Vec<_>>())
            .field("filter_backends", &self.filter_backends.len())
            .finish()
    }
}

/// Builder for [`Authorizer`]
#[derive(Default)]
pub struct AuthorizerBuilder {
    backends: Vec<Arc<dyn PermissionBackend>>,
    filter_backends: Vec<Arc<dyn FilterBackend>>,
}

impl AuthorizerBuilder {
    /// Append a backend that only answers permission checks
    #[must_use]
    pub fn backend<B: PermissionBackend + 'static>(mut self, backend: B) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    /// Append a backend that also contributes list filters
    #[must_use]
    pub fn filter_backend<B: FilterBackend + 'static>(mut self, backend: B) -> Self {
        let backend = Arc::new(backend);
        self.backends.push(Arc::clone(&backend) as Arc<dyn PermissionBackend>);
        self.filter_backends.push(backend);
        self
    }

    /// Finish the chain
    #[must_use]
    pub fn build(self) -> Authorizer {
        Authorizer {
            backends: self.backends,
            filter_backends: self.filter_backends,
        }
    }
}

/// The user of one request, bound to the authorizer and the request's cache
#[derive(Clone)]
pub struct RequestUser {
    user: Arc<dyn User>,
    authorizer: Arc<Authorizer>,
    cache: Arc<PermissionCache>,
}

impl RequestUser {
    /// Bind a user to a fresh request cache
    #[must_use]
    pub fn new(user: Arc<dyn User>, authorizer: Arc<Authorizer>) -> Self {
        Self::with_cache(user, authorizer, Arc::new(PermissionCache::new()))
    }

    /// Bind a user to an existing request cache
    #[must_use]
    pub fn with_cache(
        user: Arc<dyn User>,
        authorizer: Arc<Authorizer>,
        cache: Arc<PermissionCache>,
    ) -> Self {
        Self {
            user,
            authorizer,
            cache,
        }
    }

    /// Underlying user
    #[must_use]
    pub fn user(&self) -> &dyn User {
        self.user.as_ref()
    }

    /// User id, `None` when anonymous
    #[must_use]
    pub fn id(&self) -> Option<UserId> {
        self.user.id()
    }

    /// Whether the user is logged in
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_authenticated()
    }

    /// Whether the user is a superuser
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.user.is_superuser()
    }

    /// See [`Authorizer::has_perm`]
    #[must_use]
    pub fn has_perm(&self, permission: &PermissionId, obj: Option<&dyn Any>) -> bool {
        self.authorizer
            .has_perm(self.user.as_ref(), permission, obj, &self.cache)
    }

    /// See [`Authorizer::has_perms`]
    #[must_use]
    pub fn has_perms(&self, permissions: &[PermissionId], obj: Option<&dyn Any>) -> bool {
        self.authorizer
            .has_perms(self.user.as_ref(), permissions, obj, &self.cache)
    }

    /// See [`Authorizer::get_all_permissions`]
    #[must_use]
    pub fn get_all_permissions(&self) -> BTreeSet<PermissionId> {
        self.authorizer
            .get_all_permissions(self.user.as_ref(), &self.cache)
    }

    /// See [`Authorizer::user_get_filter`]
    #[must_use]
    pub fn get_filter(&self, permissions: &[PermissionId]) -> Q {
        self.authorizer
            .user_get_filter(self.user.as_ref(), permissions, &self.cache)
    }
}

impl std::fmt::Debug for RequestUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestUser")
            .field("id", &self.user.id())
            .field("authorizer", &self.authorizer)
            .finish()
    }
}
