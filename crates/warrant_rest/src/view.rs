//! Views and the request-level checks they run.

use crate::composite::{CompositePermission, PermissionSpec};
use crate::error::{PermissionError, PermissionResult};
use http::Method;
use std::any::Any;
use warrant_core::{ModelMeta, QuerySet, Record, conjunct};
use warrant_policy::RequestUser;

/// An incoming request as seen by permission checks
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    user: RequestUser,
}

impl Request {
    /// Create a request
    #[must_use]
    pub fn new(method: Method, user: RequestUser) -> Self {
        Self { method, user }
    }

    /// HTTP method
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Requesting user
    #[must_use]
    pub fn user(&self) -> &RequestUser {
        &self.user
    }
}

/// A REST endpoint guarded by permissions
pub trait View: Send + Sync {
    /// Name used in errors and logs
    fn name(&self) -> &str;

    /// Model of the view's queryset, if it has one
    fn queryset_model(&self) -> Option<ModelMeta> {
        None
    }

    /// Skip model permissions entirely (API root views)
    fn ignore_model_permissions(&self) -> bool {
        false
    }

    /// Permissions every request must pass
    fn permissions(&self) -> &[PermissionSpec];
}

/// Instantiate the view's permissions for one request
#[must_use]
pub fn get_permissions(view: &dyn View) -> Vec<CompositePermission> {
    view.permissions()
        .iter()
        .map(PermissionSpec::instantiate)
        .collect()
}

/// Run every permission's request-level check
///
/// # Errors
///
/// Returns [`PermissionError::NotAuthenticated`] for anonymous users and
/// [`PermissionError::PermissionDenied`] for everyone else when a check fails.
pub fn check_permissions(view: &dyn View, request: &Request) -> PermissionResult<()> {
    for permission in get_permissions(view) {
        if !permission.evaluate_permission(request, view)? {
            tracing::debug!(view = view.name(), method = %request.method(), "permission denied");
            if !request.user().is_authenticated() {
                return Err(PermissionError::NotAuthenticated);
            }
            return Err(PermissionError::PermissionDenied);
        }
    }
    Ok(())
}

/// Run every permission's object-level check
///
/// # Errors
///
/// Returns [`PermissionError::NotFound`] when a check fails, so that the
/// response does not reveal whether the object exists.
pub fn check_object_permissions(
    view: &dyn View,
    request: &Request,
    obj: &dyn Any,
) -> PermissionResult<()> {
    for permission in get_permissions(view) {
        if !permission.evaluate_object_permission(request, view, obj)? {
            tracing::debug!(
                view = view.name(),
                method = %request.method(),
                "object permission denied, reporting not found"
            );
            return Err(PermissionError::NotFound);
        }
    }
    Ok(())
}

/// Narrow a queryset to the rows every permission allows
///
/// # Errors
///
/// Returns an error if a permission cannot build its filter.
pub fn filter_queryset<T: Record>(
    view: &dyn View,
    request: &Request,
    queryset: &QuerySet<T>,
) -> PermissionResult<QuerySet<T>> {
    let filters = get_permissions(view)
        .iter()
        .map(|permission| permission.evaluate_filter(request, view))
        .collect::<PermissionResult<Vec<_>>>()?;
    Ok(queryset.filter(conjunct(filters)))
}
