//! WARRANT REST Integration
//!
//! Permission checks for REST views. A view lists [`PermissionSpec`]s, which
//! combine with `and`/`or`/`negate` and are instantiated once per request
//! into a [`CompositePermission`]. [`ObjectPermissions`] is the standard leaf:
//! it maps the request method to the model permissions it requires and routes
//! object checks and list filters through the user's authorizer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod composite;
pub mod error;
pub mod object;
pub mod permission;
pub mod view;

pub use composite::{CompositePermission, PermissionSpec};
pub use error::{PermissionError, PermissionResult};
pub use object::ObjectPermissions;
pub use permission::Permission;
pub use view::{
    Request, View, check_object_permissions, check_permissions, filter_queryset, get_permissions,
};
