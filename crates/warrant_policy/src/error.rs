//! Registry and settings errors.

use std::path::PathBuf;
use warrant_core::{CoreError, PermissionId};

/// Error from registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A policy already covers this permission; startup must abort
    #[error("Policy already registered: {permission}")]
    AlreadyRegistered {
        /// Colliding permission
        permission: PermissionId,
    },

    /// No policy covers this permission
    #[error("Policy not registered: {permission}")]
    NotRegistered {
        /// Missing permission
        permission: PermissionId,
    },

    /// The process-wide registry was installed before
    #[error("Policy registry already installed")]
    AlreadyInstalled,
}

/// Error loading or applying [`AuthSettings`](crate::AuthSettings)
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("Failed to read settings from {}: {source}", path.display())]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Settings are not valid JSON for the schema
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend name is not one of the known backends
    #[error("Unknown backend: '{name}'")]
    UnknownBackend {
        /// Offending name
        name: String,
    },

    /// HTTP method key is not an uppercase token
    #[error("Invalid method name: '{method}'")]
    InvalidMethod {
        /// Offending key
        method: String,
    },

    /// Permission template does not render
    #[error(transparent)]
    Template(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::AlreadyRegistered {
            permission: PermissionId::parse("blog.change_post").unwrap(),
        };
        assert_eq!(err.to_string(), "Policy already registered: blog.change_post");
    }

    #[test]
    fn test_settings_error_display() {
        let err = SettingsError::UnknownBackend {
            name: "ldap".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown backend: 'ldap'");
    }
}
