//! WARRANT Core Types
//!
//! This crate contains pure types and logic with no I/O:
//! permission identifiers, model metadata, the user capability,
//! and the filter algebra every policy speaks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod id;
pub mod permission;
pub mod queryset;
pub mod user;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use filter::{FilterAlgebra, Lookup, Q, Value, conjunct};
pub use id::UserId;
pub use permission::{Action, Model, ModelMeta, PermissionId, PermissionTemplate, Verb};
pub use queryset::{QuerySet, Record};
pub use user::{AnonymousUser, User};
