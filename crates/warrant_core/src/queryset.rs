//! In-memory query set.
//!
//! Storage adapters translate a [`Q`] into their own query language. This
//! module is the reference collaborator: it applies a filter to rows held in
//! memory, which is what the admin and REST layers are tested against.

use crate::filter::{Q, Value};
use crate::permission::{Model, ModelMeta};
use std::sync::Arc;

/// A row whose fields a filter can read
pub trait Record {
    /// Value of a field, `None` when the row has no such field
    fn field(&self, name: &str) -> Option<Value>;
}

/// Lazily filtered rows of one model
///
/// Filtering is cheap: rows are shared and the predicate is only evaluated
/// when the set is iterated.
#[derive(Debug)]
pub struct QuerySet<T> {
    meta: ModelMeta,
    rows: Arc<Vec<T>>,
    query: Q,
}

impl<T> Clone for QuerySet<T> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta.clone(),
            rows: Arc::clone(&self.rows),
            query: self.query.clone(),
        }
    }
}

impl<T: Model + Record> QuerySet<T> {
    /// Create an unfiltered set over the given rows
    #[must_use]
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            meta: T::meta(),
            rows: Arc::new(rows),
            query: Q::all(),
        }
    }
}

impl<T: Record> QuerySet<T> {
    /// Model the rows belong to
    #[must_use]
    pub fn model(&self) -> &ModelMeta {
        &self.meta
    }

    /// Accumulated predicate
    #[must_use]
    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Narrow the set; successive filters are ANDed
    #[must_use]
    pub fn filter(&self, q: Q) -> Self {
        Self {
            meta: self.meta.clone(),
            rows: Arc::clone(&self.rows),
            query: self.query.clone() & q,
        }
    }

    /// Iterate over matching rows
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter().filter(|row| self.query.matches(*row))
    }

    /// Number of matching rows
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Whether no row matches
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;
    use crate::testing::{Post, fixture_posts};

    #[test]
    fn test_queryset_unfiltered() {
        let qs = QuerySet::new(fixture_posts());
        assert_eq!(qs.count(), 4);
        assert_eq!(qs.model().to_string(), "blog.post");
        assert!(qs.query().is_all());
    }

    #[test]
    fn test_queryset_filter_chains() {
        let qs = QuerySet::new(fixture_posts());
        let mine = qs.filter(Q::exact("author", UserId::new(1)));
        let mine_published = mine.filter(Q::exact("published", true));
        assert_eq!(mine.count(), 2);
        assert_eq!(mine_published.count(), 1);
        // unfiltered set is untouched
        assert_eq!(qs.count(), 4);
    }

    #[test]
    fn test_queryset_none_is_empty() {
        let qs = QuerySet::<Post>::new(fixture_posts()).filter(Q::none());
        assert!(qs.is_empty());
        assert_eq!(qs.count(), 0);
    }
}
