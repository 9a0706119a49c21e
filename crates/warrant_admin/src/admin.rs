//! Model admin with object-level permissions.

use crate::related::{FormField, RelatedField};
use std::any::Any;
use warrant_core::{Action, Model, ModelMeta, PermissionId, Q, QuerySet, Record};
use warrant_policy::RequestUser;

/// An admin request
#[derive(Debug, Clone)]
pub struct AdminRequest {
    user: RequestUser,
    url_name: Option<String>,
}

impl AdminRequest {
    /// Create a request that did not resolve to a named URL
    #[must_use]
    pub fn new(user: RequestUser) -> Self {
        Self {
            user,
            url_name: None,
        }
    }

    /// Set the name of the resolved URL
    #[must_use]
    pub fn with_url_name(mut self, url_name: impl Into<String>) -> Self {
        self.url_name = Some(url_name.into());
        self
    }

    /// Requesting user
    #[must_use]
    pub fn user(&self) -> &RequestUser {
        &self.user
    }

    /// Name of the resolved URL
    #[must_use]
    pub fn url_name(&self) -> Option<&str> {
        self.url_name.as_deref()
    }
}

/// Admin for one model whose answers come from the user's authorizer
///
/// Viewing is allowed to anyone who may view or change an object. Only the
/// changelist is filtered; detail pages rely on the per-object checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPermissionsAdmin {
    opts: ModelMeta,
}

impl ObjectPermissionsAdmin {
    /// Admin for `M`
    #[must_use]
    pub fn for_model<M: Model>() -> Self {
        Self::new(M::meta())
    }

    /// Admin for a model given by its metadata
    #[must_use]
    pub fn new(opts: ModelMeta) -> Self {
        Self { opts }
    }

    /// Model the admin manages
    #[must_use]
    pub fn opts(&self) -> &ModelMeta {
        &self.opts
    }

    /// Whether the request is for this model's changelist
    #[must_use]
    pub fn is_changelist(&self, request: &AdminRequest) -> bool {
        request.url_name() == Some(self.opts.changelist_url_name().as_str())
    }

    /// Whether the user may change `obj`, or objects of the model
    #[must_use]
    pub fn has_change_permission(&self, request: &AdminRequest, obj: Option<&dyn Any>) -> bool {
        request.user().has_perm(&self.permission(Action::Change), obj)
    }

    /// Whether the user may delete `obj`, or objects of the model
    #[must_use]
    pub fn has_delete_permission(&self, request: &AdminRequest, obj: Option<&dyn Any>) -> bool {
        request.user().has_perm(&self.permission(Action::Delete), obj)
    }

    /// Whether the user may view or change `obj`, or objects of the model
    #[must_use]
    pub fn has_view_permission(&self, request: &AdminRequest, obj: Option<&dyn Any>) -> bool {
        request.user().has_perm(&self.permission(Action::View), obj)
            || self.has_change_permission(request, obj)
    }

    /// Rows visible on the changelist
    #[must_use]
    pub fn get_changelist_filter(&self, request: &AdminRequest) -> Q {
        view_or_change_filter(request.user(), &self.opts)
    }

    /// Queryset narrowed to the changelist filter
    #[must_use]
    pub fn get_changelist_queryset<T: Record>(
        &self,
        request: &AdminRequest,
        queryset: &QuerySet<T>,
    ) -> QuerySet<T> {
        queryset.filter(self.get_changelist_filter(request))
    }

    /// Queryset for the request: filtered on the changelist, unchanged elsewhere
    #[must_use]
    pub fn get_queryset<T: Record>(
        &self,
        request: &AdminRequest,
        queryset: &QuerySet<T>,
    ) -> QuerySet<T> {
        if self.is_changelist(request) {
            return self.get_changelist_queryset(request, queryset);
        }
        queryset.clone()
    }

    /// Rows of a related model the user may pick
    #[must_use]
    pub fn get_field_filter(&self, request: &AdminRequest, related: &ModelMeta) -> Q {
        view_or_change_filter(request.user(), related)
    }

    /// Form field for a foreign key, with choices limited to visible rows
    #[must_use]
    pub fn formfield_for_foreignkey(
        &self,
        field: &RelatedField,
        request: &AdminRequest,
    ) -> FormField {
        self.limited_formfield(field, request)
    }

    /// Form field for a many-to-many relation, with choices limited to
    /// visible rows
    #[must_use]
    pub fn formfield_for_manytomany(
        &self,
        field: &RelatedField,
        request: &AdminRequest,
    ) -> FormField {
        self.limited_formfield(field, request)
    }

    fn limited_formfield(&self, field: &RelatedField, request: &AdminRequest) -> FormField {
        let limit_choices_to = self.get_field_filter(request, field.related_model());
        tracing::trace!(
            field = field.name(),
            related = %field.related_model(),
            "limiting relation choices"
        );
        FormField::new(field.clone(), limit_choices_to)
    }

    fn permission(&self, action: Action) -> PermissionId {
        PermissionId::for_action(&action, &self.opts)
    }
}

/// `get_filter([view]) OR get_filter([change])` for a model
pub(crate) fn view_or_change_filter(user: &RequestUser, opts: &ModelMeta) -> Q {
    let view = user.get_filter(&[PermissionId::for_action(&Action::View, opts)]);
    let change = user.get_filter(&[PermissionId::for_action(&Action::Change, opts)]);
    view | change
}
