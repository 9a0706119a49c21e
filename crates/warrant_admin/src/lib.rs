//! WARRANT Admin Integration
//!
//! Object-level permission checks for an admin site: per-object
//! view/change/delete answers, a changelist narrowed to the rows the user may
//! see, and relation widgets and list filters limited the same way.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod admin;
pub mod related;

pub use admin::{AdminRequest, ObjectPermissionsAdmin};
pub use related::{FormField, RelatedField, RelatedFieldListFilter};
