//! Request-scoped permission cache.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use warrant_core::{PermissionId, UserId};

/// Computed permission sets, keyed by user
///
/// Create one per request and drop it with the request. Two threads racing on
/// the same user may both compute the set; the first insert wins and both
/// results are identical.
#[derive(Debug, Default)]
pub struct PermissionCache {
    entries: Mutex<HashMap<UserId, Arc<BTreeSet<PermissionId>>>>,
}

impl PermissionCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached set for `user`, computing it on first use
    pub fn get_or_compute<F>(&self, user: UserId, compute: F) -> Arc<BTreeSet<PermissionId>>
    where
        F: FnOnce() -> BTreeSet<PermissionId>,
    {
        if let Some(hit) = self.lock().get(&user) {
            return Arc::clone(hit);
        }
        let computed = Arc::new(compute());
        Arc::clone(self.lock().entry(user).or_insert(computed))
    }

    /// Number of cached users
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Arc<BTreeSet<PermissionId>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
