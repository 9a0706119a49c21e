//! The REST permission contract.

use crate::error::PermissionResult;
use crate::view::{Request, View};
use std::any::Any;
use warrant_core::Q;

/// A per-request permission check
///
/// Every method has a permissive default, so a type only spells out the
/// checks it cares about. Implementors become composable through
/// [`PermissionSpec`](crate::PermissionSpec).
pub trait Permission: Send + Sync {
    /// Whether the request may reach the view at all
    ///
    /// # Errors
    ///
    /// Returns an error when the check itself cannot be made.
    fn has_permission(&self, _request: &Request, _view: &dyn View) -> PermissionResult<bool> {
        Ok(true)
    }

    /// Whether the request may act on `obj`
    ///
    /// # Errors
    ///
    /// Returns an error when the check itself cannot be made.
    fn has_object_permission(
        &self,
        _request: &Request,
        _view: &dyn View,
        _obj: &dyn Any,
    ) -> PermissionResult<bool> {
        Ok(true)
    }

    /// Rows the request may list
    ///
    /// # Errors
    ///
    /// Returns an error when the filter cannot be built.
    fn get_filter(&self, _request: &Request, _view: &dyn View) -> PermissionResult<Q> {
        Ok(Q::all())
    }
}
