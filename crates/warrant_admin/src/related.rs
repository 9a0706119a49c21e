//! Relation widgets and list filters limited by object permissions.

use crate::admin::{AdminRequest, view_or_change_filter};
use warrant_core::{ModelMeta, Q, QuerySet, Record};

/// A foreign key or many-to-many field on an admin model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedField {
    name: String,
    related_model: ModelMeta,
}

impl RelatedField {
    /// Create a field pointing at `related_model`
    #[must_use]
    pub fn new(name: impl Into<String>, related_model: ModelMeta) -> Self {
        Self {
            name: name.into(),
            related_model,
        }
    }

    /// Field name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model the field points at
    #[must_use]
    pub fn related_model(&self) -> &ModelMeta {
        &self.related_model
    }
}

/// Form field whose choices are limited by a filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    field: RelatedField,
    limit_choices_to: Q,
}

impl FormField {
    /// Create a form field
    #[must_use]
    pub fn new(field: RelatedField, limit_choices_to: Q) -> Self {
        Self {
            field,
            limit_choices_to,
        }
    }

    /// Underlying model field
    #[must_use]
    pub fn field(&self) -> &RelatedField {
        &self.field
    }

    /// Filter applied to the choices
    #[must_use]
    pub fn limit_choices_to(&self) -> &Q {
        &self.limit_choices_to
    }

    /// Narrow the related rows to the allowed choices
    #[must_use]
    pub fn choices<T: Record>(&self, related: &QuerySet<T>) -> QuerySet<T> {
        related.filter(self.limit_choices_to.clone())
    }
}

/// Changelist filter over a relation, offering only related rows the user
/// may view or change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedFieldListFilter {
    field: RelatedField,
}

impl RelatedFieldListFilter {
    /// Create a list filter for `field`
    #[must_use]
    pub fn new(field: RelatedField) -> Self {
        Self { field }
    }

    /// Field the filter lists choices for
    #[must_use]
    pub fn field(&self) -> &RelatedField {
        &self.field
    }

    /// Related rows offered as filter choices
    #[must_use]
    pub fn field_choices<T: Record>(
        &self,
        request: &AdminRequest,
        related: &QuerySet<T>,
    ) -> QuerySet<T> {
        let filter = view_or_change_filter(request.user(), self.field.related_model());
        related.filter(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warrant_core::testing::{Blog, TestUser, fixture_blogs};
    use warrant_core::{Action, Model, User};
    use warrant_policy::{AuthSettings, Authorizer, Policy, PolicyRegistry, RequestUser};

    struct OwnerPolicy;

    impl Policy<Blog> for OwnerPolicy {
        fn get_filter(&self, user: &dyn User) -> Q {
            user.id().map_or(Q::none(), |id| Q::exact("owner", id))
        }
    }

    fn request(user: TestUser) -> AdminRequest {
        let mut registry = PolicyRegistry::new();
        registry
            .register::<Blog>(&[Action::Change])
            .policy(OwnerPolicy)
            .unwrap();
        let authorizer =
            Authorizer::from_settings(&AuthSettings::default(), Arc::new(registry)).unwrap();
        AdminRequest::new(RequestUser::new(Arc::new(user), Arc::new(authorizer)))
    }

    fn blog_ids(queryset: &QuerySet<Blog>) -> Vec<i64> {
        queryset.iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_field_choices_view_unrestricted() {
        let filter = RelatedFieldListFilter::new(RelatedField::new("blog", Blog::meta()));
        let req = request(TestUser::new(1).with_perm("blog.view_blog"));
        let choices = filter.field_choices(&req, &QuerySet::new(fixture_blogs()));
        assert_eq!(blog_ids(&choices), vec![10, 20]);
    }

    #[test]
    fn test_field_choices_change_by_owner() {
        let filter = RelatedFieldListFilter::new(RelatedField::new("blog", Blog::meta()));
        let req = request(TestUser::new(1).with_perm("blog.change_blog"));
        let choices = filter.field_choices(&req, &QuerySet::new(fixture_blogs()));
        assert_eq!(blog_ids(&choices), vec![10]);
    }

    #[test]
    fn test_field_choices_without_permissions() {
        let filter = RelatedFieldListFilter::new(RelatedField::new("blog", Blog::meta()));
        let req = request(TestUser::new(1));
        assert!(filter.field_choices(&req, &QuerySet::new(fixture_blogs())).is_empty());
    }

    #[test]
    fn test_formfield_choices() {
        let field = FormField::new(RelatedField::new("blog", Blog::meta()), Q::exact("owner", 2));
        assert_eq!(field.field().name(), "blog");
        assert_eq!(blog_ids(&field.choices(&QuerySet::new(fixture_blogs()))), vec![20]);
    }
}
