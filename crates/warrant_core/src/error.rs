//! Core error types for WARRANT.

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Permission identifier is not of the form `<app_label>.<codename>`
    #[error("Invalid permission '{value}': {reason}")]
    InvalidPermission {
        /// Offending input
        value: String,
        /// What is wrong with it
        reason: String,
    },

    /// Model label is not of the form `<app_label>.<model_name>`
    #[error("Invalid model '{value}': {reason}")]
    InvalidModel {
        /// Offending input
        value: String,
        /// What is wrong with it
        reason: String,
    },

    /// Action verb cannot be used inside a codename
    #[error("Invalid action: '{value}'")]
    InvalidAction {
        /// Offending input
        value: String,
    },

    /// Permission template could not be rendered
    #[error("Invalid permission template '{template}': {reason}")]
    InvalidTemplate {
        /// Offending template
        template: String,
        /// What is wrong with it
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn permission(value: &str, reason: &str) -> Self {
        Self::InvalidPermission {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn model(value: &str, reason: &str) -> Self {
        Self::InvalidModel {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
