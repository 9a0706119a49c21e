//! WARRANT Policy System
//!
//! Per-model, per-action policies layered on top of model-level permissions.
//! A [`PolicyRegistry`] maps permission identifiers to policies; the
//! [`Authorizer`] chains permission backends and is the entry point the admin
//! and REST layers call through a [`RequestUser`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authorizer;
pub mod backend;
pub mod cache;
pub mod error;
pub mod policy;
pub mod registry;
pub mod settings;

pub use authorizer::{Authorizer, AuthorizerBuilder, RequestUser};
pub use backend::{FilterBackend, ModelBackend, PermissionBackend, PolicyBackend};
pub use cache::PermissionCache;
pub use error::{RegistryError, SettingsError};
pub use policy::{ErasedPolicy, Policy, PolicyExt};
pub use registry::{PolicyModule, PolicyRegistry, Registration, install, installed};
pub use settings::{AuthSettings, BackendKind};
