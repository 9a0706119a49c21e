//! Permission identifiers and the model metadata they are derived from.
//!
//! A permission identifier is the string `"<app_label>.<action>_<model_name>"`,
//! e.g. `"blog.change_post"`. It is derived deterministically from a model's
//! metadata and an action verb and never changes once built.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Borrow;
use std::str::FromStr;

/// Action verb a permission is granted for
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Action {
    /// Read access
    View,
    /// Creation
    Add,
    /// Modification
    Change,
    /// Removal
    Delete,
    /// Application-defined verb (e.g. `publish`)
    Custom(Verb),
}

/// Application-defined action verb, restricted to ASCII alphanumerics and `_`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Verb(String);

impl Verb {
    /// Get the verb text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Action {
    /// Create a custom action verb
    ///
    /// # Errors
    ///
    /// Returns error if the verb is empty or holds characters that cannot
    /// appear in a codename
    pub fn custom(verb: &str) -> CoreResult<Self> {
        let valid =
            !verb.is_empty() && verb.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(CoreError::InvalidAction {
                value: verb.to_string(),
            });
        }
        Ok(match verb {
            "view" => Self::View,
            "add" => Self::Add,
            "change" => Self::Change,
            "delete" => Self::Delete,
            other => Self::Custom(Verb(other.to_string())),
        })
    }

    /// Get the verb as it appears in codenames
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::View => "view",
            Self::Add => "add",
            Self::Change => "change",
            Self::Delete => "delete",
            Self::Custom(verb) => verb.as_str(),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::custom(s)
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl TryFrom<String> for Action {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::custom(&value)
    }
}

/// Metadata naming a model: the application it lives in and its name
///
/// Both labels are non-empty and free of '.' and whitespace, so every
/// permission derived from the metadata parses back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ModelMeta {
    app_label: String,
    model_name: String,
}

impl ModelMeta {
    /// Create model metadata; the model name is stored lowercased
    ///
    /// # Errors
    ///
    /// Returns error if either label is empty or holds '.' or whitespace
    pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> CoreResult<Self> {
        let app_label = app_label.into();
        let model_name = model_name.into().to_lowercase();
        if !is_label(&app_label) || !is_label(&model_name) {
            return Err(CoreError::model(
                &format!("{app_label}.{model_name}"),
                "labels must be non-empty without '.' or whitespace",
            ));
        }
        Ok(Self {
            app_label,
            model_name,
        })
    }

    /// Parse a `"<app_label>.<model_name>"` label
    ///
    /// # Errors
    ///
    /// Returns error if the label is malformed
    pub fn parse(label: &str) -> CoreResult<Self> {
        let (app_label, model_name) = label
            .split_once('.')
            .ok_or_else(|| CoreError::model(label, "expected '<app_label>.<model_name>'"))?;
        Self::new(app_label, model_name)
    }

    /// Application label
    #[must_use]
    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    /// Lowercased model name
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Codename for an action on this model (`"<action>_<model_name>"`)
    #[must_use]
    pub fn codename(&self, action: &Action) -> String {
        format!("{}_{}", action, self.model_name)
    }

    /// Permission identifier for an action on this model
    #[must_use]
    pub fn permission(&self, action: &Action) -> PermissionId {
        PermissionId::for_action(action, self)
    }

    /// URL name of this model's admin changelist page
    #[must_use]
    pub fn changelist_url_name(&self) -> String {
        format!("{}_{}_changelist", self.app_label, self.model_name)
    }
}

impl std::fmt::Display for ModelMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

impl FromStr for ModelMeta {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl From<ModelMeta> for String {
    fn from(meta: ModelMeta) -> Self {
        meta.to_string()
    }
}

impl TryFrom<String> for ModelMeta {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::parse(&value)
    }
}

/// A model type the permission layer can name
pub trait Model: Any + Send + Sync {
    /// Metadata of this model, usually built from literal labels
    fn meta() -> ModelMeta;
}

/// Permission identifier - `"<app_label>.<codename>"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PermissionId(String);

impl PermissionId {
    /// Build from an app label and a codename
    ///
    /// # Errors
    ///
    /// Returns error if either part is malformed
    pub fn new(app_label: &str, codename: &str) -> CoreResult<Self> {
        Self::parse(&format!("{}.{}", app_label, codename))
    }

    /// Derive the identifier for an action on a model
    ///
    /// Infallible: validated labels and verbs always join into a parseable
    /// identifier.
    #[must_use]
    pub fn for_action(action: &Action, meta: &ModelMeta) -> Self {
        Self(format!("{}.{}", meta.app_label(), meta.codename(action)))
    }

    /// Parse an identifier string
    ///
    /// # Errors
    ///
    /// Returns error unless the input is exactly two non-empty labels
    /// joined by a single '.'
    pub fn parse(s: &str) -> CoreResult<Self> {
        let (app_label, codename) = s
            .split_once('.')
            .ok_or_else(|| CoreError::permission(s, "expected '<app_label>.<codename>'"))?;
        if !is_label(app_label) || !is_label(codename) {
            return Err(CoreError::permission(
                s,
                "labels must be non-empty without '.' or whitespace",
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Get as string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Application label part
    #[must_use]
    pub fn app_label(&self) -> &str {
        self.0.split_once('.').map_or("", |(app, _)| app)
    }

    /// Codename part
    #[must_use]
    pub fn codename(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, codename)| codename)
    }
}

impl std::fmt::Display for PermissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PermissionId {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl Borrow<str> for PermissionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PermissionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<PermissionId> for String {
    fn from(id: PermissionId) -> Self {
        id.0
    }
}

impl TryFrom<String> for PermissionId {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::parse(&value)
    }
}

/// Template rendered against a model into a permission identifier
///
/// Recognised placeholders are `{app_label}` and `{model_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTemplate(String);

impl PermissionTemplate {
    /// Create a template from raw text
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Template for the standard permission of an action
    #[must_use]
    pub fn for_action(action: &Action) -> Self {
        Self(format!("{{app_label}}.{}_{{model_name}}", action))
    }

    /// Get the raw template text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render against a model
    ///
    /// # Errors
    ///
    /// Returns error on unknown placeholders or if the rendered text is not
    /// a valid permission identifier
    pub fn render(&self, meta: &ModelMeta) -> CoreResult<PermissionId> {
        let rendered = self
            .0
            .replace("{app_label}", meta.app_label())
            .replace("{model_name}", meta.model_name());
        if rendered.contains('{') || rendered.contains('}') {
            return Err(self.invalid("unknown placeholder"));
        }
        PermissionId::parse(&rendered).map_err(|e| self.invalid(&e.to_string()))
    }

    /// Check that the template renders for an arbitrary model
    ///
    /// # Errors
    ///
    /// Returns the render error, if any
    pub fn validate(&self) -> CoreResult<()> {
        let meta = ModelMeta::new("app", "model")?;
        self.render(&meta).map(|_| ())
    }

    fn invalid(&self, reason: &str) -> CoreError {
        CoreError::InvalidTemplate {
            template: self.0.clone(),
            reason: reason.to_string(),
        }
    }
}

fn is_label(s: &str) -> bool {
    !s.is_empty() && !s.contains('.') && !s.chars().any(char::is_whitespace)
}
