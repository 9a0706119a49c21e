//! REST permission errors.

use http::StatusCode;
use warrant_core::CoreError;

/// Result type for REST permission checks
pub type PermissionResult<T> = Result<T, PermissionError>;

/// Error raised while checking a request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// No permissions are mapped for the request method
    #[error("Method \"{method}\" not allowed.")]
    MethodNotAllowed {
        /// Request method
        method: String,
    },

    /// Anonymous user hit a view that needs a login
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    /// Authenticated user lacks a permission
    #[error("You do not have permission to perform this action.")]
    PermissionDenied,

    /// Object exists but the user may not see it; reported as missing
    #[error("Not found.")]
    NotFound,

    /// View checked by object permissions has no queryset model
    #[error("Cannot apply {permission} on view '{view}' that does not set a queryset")]
    MissingQueryset {
        /// Permission that needed the queryset
        permission: &'static str,
        /// Offending view
        view: String,
    },

    /// Method map template does not render for the model
    #[error(transparent)]
    Template(#[from] CoreError),
}

impl PermissionError {
    /// HTTP status the error is reported with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MissingQueryset { .. } | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller, not the application, is at fault
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let method = PermissionError::MethodNotAllowed {
            method: "TRACE".to_string(),
        };
        assert_eq!(method.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(PermissionError::NotAuthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(PermissionError::PermissionDenied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(PermissionError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert!(method.is_client_error());
    }

    #[test]
    fn test_missing_queryset_is_server_error() {
        let err = PermissionError::MissingQueryset {
            permission: "ObjectPermissions",
            view: "root".to_string(),
        };
        assert!(!err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Cannot apply ObjectPermissions on view 'root' that does not set a queryset"
        );
    }

    #[test]
    fn test_method_not_allowed_display() {
        let err = PermissionError::MethodNotAllowed {
            method: "TRACE".to_string(),
        };
        assert_eq!(err.to_string(), "Method \"TRACE\" not allowed.");
    }
}
