//! Identifiers for WARRANT entities.

use crate::filter::Value;
use serde::{Deserialize, Serialize};

/// User identifier - the primary key of an authenticated account
///
/// Anonymous users have no identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Create from a raw primary key
    #[must_use]
    pub const fn new(pk: i64) -> Self {
        Self(pk)
    }

    /// Get the raw primary key
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user_{}", self.0)
    }
}

impl From<UserId> for Value {
    fn from(id: UserId) -> Self {
        Value::Int(id.0)
    }
}
