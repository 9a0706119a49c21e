//! Model and object permissions keyed by HTTP method.

use crate::error::{PermissionError, PermissionResult};
use crate::permission::Permission;
use crate::view::{Request, View};
use http::Method;
use indexmap::IndexMap;
use std::any::Any;
use std::sync::Arc;
use warrant_core::{Action, ModelMeta, PermissionId, PermissionTemplate, Q};
use warrant_policy::{AuthSettings, SettingsError};

/// Requires the model permissions mapped to the request method
///
/// | method | requires |
/// |--------|----------|
/// | `GET` | `{app_label}.view_{model_name}` |
/// | `POST` | `{app_label}.add_{model_name}` |
/// | `PUT`, `PATCH` | `{app_label}.change_{model_name}` |
/// | `DELETE` | `{app_label}.delete_{model_name}` |
/// | `OPTIONS`, `HEAD` | nothing |
///
/// Any other method is rejected with [`PermissionError::MethodNotAllowed`].
/// Object checks and list filters go through the user's authorizer, so
/// registered policies apply.
#[derive(Debug, Clone)]
pub struct ObjectPermissions {
    perms_map: Arc<IndexMap<Method, Vec<PermissionTemplate>>>,
}

impl Default for ObjectPermissions {
    fn default() -> Self {
        let view = vec![PermissionTemplate::for_action(&Action::View)];
        let add = vec![PermissionTemplate::for_action(&Action::Add)];
        let change = vec![PermissionTemplate::for_action(&Action::Change)];
        let delete = vec![PermissionTemplate::for_action(&Action::Delete)];

        let mut perms_map = IndexMap::new();
        perms_map.insert(Method::GET, view);
        perms_map.insert(Method::OPTIONS, Vec::new());
        perms_map.insert(Method::HEAD, Vec::new());
        perms_map.insert(Method::POST, add);
        perms_map.insert(Method::PUT, change.clone());
        perms_map.insert(Method::PATCH, change);
        perms_map.insert(Method::DELETE, delete);
        Self {
            perms_map: Arc::new(perms_map),
        }
    }
}

impl ObjectPermissions {
    /// Default method map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default method map with the settings' overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if the settings do not validate.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let mut permissions = Self::default();
        for (method, templates) in &settings.object_permissions {
            let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
                SettingsError::InvalidMethod {
                    method: method.clone(),
                }
            })?;
            permissions = permissions.with_method(method, templates.clone());
        }
        Ok(permissions)
    }

    /// Replace the templates required for one method
    #[must_use]
    pub fn with_method(mut self, method: Method, templates: Vec<PermissionTemplate>) -> Self {
        Arc::make_mut(&mut self.perms_map).insert(method, templates);
        self
    }

    /// Methods the map allows
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.perms_map.keys()
    }

    /// Permissions a request with `method` needs on `model`
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::MethodNotAllowed`] for an unmapped method.
    pub fn get_required_permissions(
        &self,
        method: &Method,
        model: &ModelMeta,
    ) -> PermissionResult<Vec<PermissionId>> {
        let Some(templates) = self.perms_map.get(method) else {
            tracing::debug!(%method, %model, "method not allowed");
            return Err(PermissionError::MethodNotAllowed {
                method: method.to_string(),
            });
        };
        templates
            .iter()
            .map(|template| template.render(model).map_err(PermissionError::from))
            .collect()
    }

    fn queryset_model(&self, view: &dyn View) -> PermissionResult<ModelMeta> {
        view.queryset_model()
            .ok_or_else(|| PermissionError::MissingQueryset {
                permission: "ObjectPermissions",
                view: view.name().to_string(),
            })
    }

    fn required(&self, request: &Request, view: &dyn View) -> PermissionResult<Vec<PermissionId>> {
        let model = self.queryset_model(view)?;
        self.get_required_permissions(request.method(), &model)
    }
}

impl Permission for ObjectPermissions {
    fn has_permission(&self, request: &Request, view: &dyn View) -> PermissionResult<bool> {
        if view.ignore_model_permissions() {
            return Ok(true);
        }
        if !request.user().is_authenticated() {
            return Ok(false);
        }
        let perms = self.required(request, view)?;
        Ok(request.user().has_perms(&perms, None))
    }

    fn has_object_permission(
        &self,
        request: &Request,
        view: &dyn View,
        obj: &dyn Any,
    ) -> PermissionResult<bool> {
        let perms = self.required(request, view)?;
        Ok(request.user().has_perms(&perms, Some(obj)))
    }

    fn get_filter(&self, request: &Request, view: &dyn View) -> PermissionResult<Q> {
        let perms = self.required(request, view)?;
        Ok(request.user().get_filter(&perms))
    }
}
