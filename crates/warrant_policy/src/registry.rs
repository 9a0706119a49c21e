//! Policy registry.
//!
//! The registry is built once at startup from an explicit list of
//! [`PolicyModule`]s and is read-only afterwards, so concurrent readers need
//! no locking.

use crate::error::RegistryError;
use crate::policy::{BoundPolicy, ErasedPolicy, Policy};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;
use warrant_core::{Action, Model, PermissionId, Q, User, conjunct};

/// Registration function contributed by one application
#[derive(Debug, Clone, Copy)]
pub struct PolicyModule {
    /// Application name, for logs
    pub name: &'static str,
    /// Registers the application's policies
    pub register: fn(&mut PolicyRegistry) -> Result<(), RegistryError>,
}

impl PolicyModule {
    /// Create a policy module
    #[must_use]
    pub const fn new(
        name: &'static str,
        register: fn(&mut PolicyRegistry) -> Result<(), RegistryError>,
    ) -> Self {
        Self { name, register }
    }
}

/// Table of permission identifier to policy
#[derive(Default)]
pub struct PolicyRegistry {
    policies: IndexMap<PermissionId, Arc<dyn ErasedPolicy>>,
}

impl PolicyRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            policies: IndexMap::new(),
        }
    }

    /// Build a registry by running every module in order
    ///
    /// # Errors
    ///
    /// Returns the first registration failure
    pub fn discover(modules: &[PolicyModule]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for module in modules {
            tracing::debug!(module = module.name, "registering policies");
            (module.register)(&mut registry)?;
        }
        tracing::debug!(count = registry.len(), "policy registry ready");
        Ok(registry)
    }

    /// Start registering a policy for `actions` on model `M`
    ///
    /// The policy handed to [`Registration::policy`] is shared by every
    /// action.
    pub fn register<M: Model>(&mut self, actions: &[Action]) -> Registration<'_, M> {
        Registration {
            registry: self,
            actions: actions.to_vec(),
            _model: PhantomData,
        }
    }

    fn insert_all(
        &mut self,
        permissions: Vec<PermissionId>,
        policy: Arc<dyn ErasedPolicy>,
    ) -> Result<(), RegistryError> {
        // Validate every key before touching the table.
        let mut seen = BTreeSet::new();
        for permission in &permissions {
            if self.policies.contains_key(permission) || !seen.insert(permission) {
                tracing::warn!(%permission, "duplicate policy registration");
                return Err(RegistryError::AlreadyRegistered {
                    permission: permission.clone(),
                });
            }
        }

        for permission in permissions {
            tracing::debug!(%permission, "policy registered");
            self.policies.insert(permission, Arc::clone(&policy));
        }
        Ok(())
    }

    /// Look up the policy for a permission
    ///
    /// # Errors
    ///
    /// Returns error if no policy covers the permission
    pub fn get_policy(
        &self,
        permission: &PermissionId,
    ) -> Result<Arc<dyn ErasedPolicy>, RegistryError> {
        self.policies
            .get(permission)
            .map(Arc::clone)
            .ok_or_else(|| RegistryError::NotRegistered {
                permission: permission.clone(),
            })
    }

    /// Policies for the registered permissions among `permissions`
    ///
    /// Unregistered permissions are skipped.
    pub fn get_policies<'a>(
        &'a self,
        permissions: &'a [PermissionId],
    ) -> impl Iterator<Item = Arc<dyn ErasedPolicy>> + 'a {
        permissions
            .iter()
            .filter_map(|permission| self.get_policy(permission).ok())
    }

    /// Object-level check for one permission
    ///
    /// An unregistered permission places no restriction and yields `true`.
    #[must_use]
    pub fn has_perm(&self, user: &dyn User, permission: &PermissionId, obj: &dyn Any) -> bool {
        match self.get_policy(permission) {
            Ok(policy) => policy.has_perm_final(user, obj),
            Err(_) => true,
        }
    }

    /// AND of the distinct filters of every registered policy among
    /// `permissions`; `Q::all()` when none is registered
    #[must_use]
    pub fn get_filter(&self, user: &dyn User, permissions: &[PermissionId]) -> Q {
        conjunct(
            self.get_policies(permissions)
                .map(|policy| policy.get_filter_final(user)),
        )
    }

    /// Whether a policy covers the permission
    #[must_use]
    pub fn contains(&self, permission: &PermissionId) -> bool {
        self.policies.contains_key(permission)
    }

    /// Registered permissions, in registration order
    pub fn permissions(&self) -> impl Iterator<Item = &PermissionId> {
        self.policies.keys()
    }

    /// Number of registered permissions
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("permissions", &self.policies.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Pending registration returned by [`PolicyRegistry::register`]
#[must_use = "nothing is registered until a policy is supplied"]
pub struct Registration<'r, M> {
    registry: &'r mut PolicyRegistry,
    actions: Vec<Action>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Registration<'_, M> {
    /// Register `policy` for every action; all-or-nothing
    ///
    /// # Errors
    ///
    /// Returns error, leaving the registry unchanged, if any action is
    /// already covered or listed twice
    pub fn policy<P: Policy<M>>(self, policy: P) -> Result<(), RegistryError> {
        let meta = M::meta();
        let permissions = self
            .actions
            .iter()
            .map(|action| meta.permission(action))
            .collect();
        let bound: Arc<dyn ErasedPolicy> = Arc::new(BoundPolicy::<M, P>::new(policy));
        self.registry.insert_all(permissions, bound)
    }
}

static INSTALLED: OnceCell<Arc<PolicyRegistry>> = OnceCell::new();

/// Install the process-wide registry; callable once
///
/// # Errors
///
/// Returns error if a registry was installed before
pub fn install(registry: PolicyRegistry) -> Result<Arc<PolicyRegistry>, RegistryError> {
    let registry = Arc::new(registry);
    INSTALLED
        .set(Arc::clone(&registry))
        .map_err(|_| RegistryError::AlreadyInstalled)?;
    Ok(registry)
}

/// The process-wide registry, if installed
#[must_use]
pub fn installed() -> Option<Arc<PolicyRegistry>> {
    INSTALLED.get().cloned()
}
