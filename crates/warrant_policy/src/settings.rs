//! Authorization settings.
//!
//! Settings are plain JSON:
//!
//! ```json
//! {
//!   "backends": ["policies"],
//!   "object_permissions": {
//!     "POST": ["{app_label}.add_{model_name}", "{app_label}.publish_{model_name}"]
//!   }
//! }
//! ```
//!
//! `backends` lists the authorization chain in order. `object_permissions`
//! overrides the permissions the REST layer requires per HTTP method; methods
//! not listed keep their defaults.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use warrant_core::PermissionTemplate;

/// Backends the settings can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Model-level permissions only
    Model,
    /// Model-level permissions plus registered policies
    Policies,
}

impl BackendKind {
    /// Resolve a settings name
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownBackend`] for any other name.
    pub fn parse(name: &str) -> Result<Self, SettingsError> {
        match name {
            "model" => Ok(Self::Model),
            "policies" => Ok(Self::Policies),
            other => Err(SettingsError::UnknownBackend {
                name: other.to_string(),
            }),
        }
    }

    /// Settings name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Policies => "policies",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSettings {
    /// Backend chain, in order
    pub backends: Vec<String>,
    /// Per-method permission templates for object-level REST checks
    pub object_permissions: BTreeMap<String, Vec<PermissionTemplate>>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            backends: vec![BackendKind::Policies.as_str().to_string()],
            object_permissions: BTreeMap::new(),
        }
    }
}

impl AuthSettings {
    /// Parse and validate settings from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails [`Self::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            backends = ?settings.backends,
            "loaded auth settings"
        );
        Ok(settings)
    }

    /// Check backend names, method keys and templates
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.backend_kinds()?;
        for (method, templates) in &self.object_permissions {
            if !is_method_token(method) {
                return Err(SettingsError::InvalidMethod {
                    method: method.clone(),
                });
            }
            for template in templates {
                template.validate()?;
            }
        }
        Ok(())
    }

    /// Resolved backend chain
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownBackend`] for the first unknown name.
    pub fn backend_kinds(&self) -> Result<Vec<BackendKind>, SettingsError> {
        self.backends.iter().map(|name| BackendKind::parse(name)).collect()
    }
}

fn is_method_token(method: &str) -> bool {
    !method.is_empty() && method.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = AuthSettings::default();
        assert_eq!(settings.backend_kinds().unwrap(), vec![BackendKind::Policies]);
        assert!(settings.object_permissions.is_empty());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let settings = AuthSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, AuthSettings::default());
    }

    #[test]
    fn test_parse_overrides() {
        let settings = AuthSettings::from_json_str(
            r#"{
                "backends": ["model", "policies"],
                "object_permissions": {"POST": ["{app_label}.publish_{model_name}"]}
            }"#,
        )
        .unwrap();
        assert_eq!(
            settings.backend_kinds().unwrap(),
            vec![BackendKind::Model, BackendKind::Policies]
        );
        assert_eq!(settings.object_permissions["POST"].len(), 1);
    }

    #[test]
    fn test_unknown_backend() {
        let err = AuthSettings::from_json_str(r#"{"backends": ["ldap"]}"#).unwrap_err();
        assert!(matches!(err, SettingsError::UnknownBackend { name } if name == "ldap"));
    }

    #[test]
    fn test_lowercase_method_rejected() {
        let err =
            AuthSettings::from_json_str(r#"{"object_permissions": {"post": []}}"#).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidMethod { .. }));
    }

    #[test]
    fn test_bad_template_rejected() {
        let err = AuthSettings::from_json_str(r#"{"object_permissions": {"GET": ["{app}.view"]}}"#)
            .unwrap_err();
        assert!(matches!(err, SettingsError::Template(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = AuthSettings::from_json_str(r#"{"backend": []}"#).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"backends": ["model"]}}"#).unwrap();
        let settings = AuthSettings::from_path(file.path()).unwrap();
        assert_eq!(settings.backend_kinds().unwrap(), vec![BackendKind::Model]);
    }

    #[test]
    fn test_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = AuthSettings::from_path(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
