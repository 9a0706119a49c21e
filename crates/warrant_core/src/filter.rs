//! Filter algebra.
//!
//! A [`Q`] is an immutable predicate over a model's rows. Filters are closed
//! under AND, OR and NOT and have two constants: [`Q::all`] matches every row
//! (identity for AND, absorbing for OR) and [`Q::none`] matches no row
//! (absorbing for AND, identity for OR).
//!
//! Composite nodes keep their children in a sorted set, so composition is
//! commutative, associative and idempotent structurally, not only when
//! evaluated.

use crate::queryset::Record;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::Hash;

/// A field value a lookup compares against
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    /// SQL-style null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    Str(String),
}

impl Value {
    /// Order two values of the same kind; mixed kinds are incomparable
    fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Comparison applied to a single field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lookup {
    /// Equal to the value; `Exact(Null)` behaves like `IsNull(true)`
    Exact(Value),
    /// Member of the set
    In(BTreeSet<Value>),
    /// Strictly less than
    Lt(Value),
    /// Less than or equal
    Lte(Value),
    /// Strictly greater than
    Gt(Value),
    /// Greater than or equal
    Gte(Value),
    /// Null (true) or not null (false)
    IsNull(bool),
}

impl Lookup {
    fn test(&self, field: &Value) -> bool {
        match self {
            Self::Exact(Value::Null) => *field == Value::Null,
            Self::IsNull(expected) => (*field == Value::Null) == *expected,
            _ if *field == Value::Null => false,
            Self::Exact(v) => field == v,
            Self::In(values) => values.contains(field),
            Self::Lt(v) => field.compare(v) == Some(Ordering::Less),
            Self::Lte(v) => matches!(field.compare(v), Some(Ordering::Less | Ordering::Equal)),
            Self::Gt(v) => field.compare(v) == Some(Ordering::Greater),
            Self::Gte(v) => {
                matches!(field.compare(v), Some(Ordering::Greater | Ordering::Equal))
            }
        }
    }
}

/// Query predicate
///
/// The variants are public for matching. Build values with [`Q::field`],
/// [`Q::and`], [`Q::or`] and [`Q::negate`] (or the `&`, `|`, `!` operators),
/// which keep the tree normalized; a hand-built variant may break the
/// invariants below. Deserialization goes through the same constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawQ")]
pub enum Q {
    /// Matches every row
    All,
    /// Matches no row
    Nothing,
    /// Single field lookup
    Field {
        /// Field name
        field: String,
        /// Comparison
        lookup: Lookup,
    },
    /// Every child matches; always two or more children
    And(BTreeSet<Q>),
    /// Some child matches; always two or more children
    Or(BTreeSet<Q>),
    /// Operand does not match; never wraps a constant or another `Not`
    Not(Box<Q>),
}

impl Q {
    /// The always-true filter
    #[must_use]
    pub fn all() -> Self {
        Self::All
    }

    /// The always-false filter
    #[must_use]
    pub fn none() -> Self {
        Self::Nothing
    }

    /// Lookup on a field
    #[must_use]
    pub fn field(field: impl Into<String>, lookup: Lookup) -> Self {
        if let Lookup::In(values) = &lookup {
            if values.is_empty() {
                return Self::Nothing;
            }
        }
        Self::Field {
            field: field.into(),
            lookup,
        }
    }

    /// `field == value`
    #[must_use]
    pub fn exact(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Lookup::Exact(value.into()))
    }

    /// `field IN values`; an empty set matches nothing
    #[must_use]
    pub fn one_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::field(field, Lookup::In(values.into_iter().map(Into::into).collect()))
    }

    /// Conjunction
    #[must_use]
    pub fn and(self, other: Q) -> Q {
        match (self, other) {
            (Self::Nothing, _) | (_, Self::Nothing) => Self::Nothing,
            (Self::All, q) | (q, Self::All) => q,
            (a, b) => {
                let mut children = BTreeSet::new();
                for q in [a, b] {
                    match q {
                        Self::And(inner) => children.extend(inner),
                        other => {
                            children.insert(other);
                        }
                    }
                }
                collapse(children, Self::And, Self::All)
            }
        }
    }

    /// Disjunction
    #[must_use]
    pub fn or(self, other: Q) -> Q {
        match (self, other) {
            (Self::All, _) | (_, Self::All) => Self::All,
            (Self::Nothing, q) | (q, Self::Nothing) => q,
            (a, b) => {
                let mut children = BTreeSet::new();
                for q in [a, b] {
                    match q {
                        Self::Or(inner) => children.extend(inner),
                        other => {
                            children.insert(other);
                        }
                    }
                }
                collapse(children, Self::Or, Self::Nothing)
            }
        }
    }

    /// Negation
    #[must_use]
    pub fn negate(self) -> Q {
        match self {
            Self::All => Self::Nothing,
            Self::Nothing => Self::All,
            Self::Not(inner) => *inner,
            q => Self::Not(Box::new(q)),
        }
    }

    /// Whether this is the always-true filter
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether this is the always-false filter
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    /// Evaluate against a row; unknown fields read as null
    #[must_use]
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        match self {
            Self::All => true,
            Self::Nothing => false,
            Self::Field { field, lookup } => {
                lookup.test(&record.field(field).unwrap_or(Value::Null))
            }
            Self::And(children) => children.iter().all(|q| q.matches(record)),
            Self::Or(children) => children.iter().any(|q| q.matches(record)),
            Self::Not(inner) => !inner.matches(record),
        }
    }
}

/// Wire form of [`Q`], rebuilt through the normalizing constructors
#[derive(Deserialize)]
enum RawQ {
    All,
    Nothing,
    Field { field: String, lookup: Lookup },
    And(Vec<RawQ>),
    Or(Vec<RawQ>),
    Not(Box<RawQ>),
}

impl From<RawQ> for Q {
    fn from(raw: RawQ) -> Self {
        match raw {
            RawQ::All => Q::All,
            RawQ::Nothing => Q::Nothing,
            RawQ::Field { field, lookup } => Q::field(field, lookup),
            RawQ::And(children) => children.into_iter().map(Q::from).fold(Q::All, Q::and),
            RawQ::Or(children) => children.into_iter().map(Q::from).fold(Q::Nothing, Q::or),
            RawQ::Not(inner) => Q::from(*inner).negate(),
        }
    }
}

fn collapse(children: BTreeSet<Q>, wrap: fn(BTreeSet<Q>) -> Q, empty: Q) -> Q {
    if children.len() > 1 {
        wrap(children)
    } else {
        children.into_iter().next().unwrap_or(empty)
    }
}

impl std::ops::BitAnd for Q {
    type Output = Q;

    fn bitand(self, rhs: Q) -> Q {
        self.and(rhs)
    }
}

impl std::ops::BitOr for Q {
    type Output = Q;

    fn bitor(self, rhs: Q) -> Q {
        self.or(rhs)
    }
}

impl std::ops::Not for Q {
    type Output = Q;

    fn not(self) -> Q {
        self.negate()
    }
}

/// Contract a storage layer's predicate type must satisfy
pub trait FilterAlgebra: Clone + Eq + Hash {
    /// The always-true filter
    fn all() -> Self;
    /// The always-false filter
    fn none() -> Self;
    /// Conjunction
    fn and(self, other: Self) -> Self;
    /// Disjunction
    fn or(self, other: Self) -> Self;
    /// Negation
    fn negate(self) -> Self;
}

impl FilterAlgebra for Q {
    fn all() -> Self {
        Q::All
    }

    fn none() -> Self {
        Q::Nothing
    }

    fn and(self, other: Self) -> Self {
        Q::and(self, other)
    }

    fn or(self, other: Self) -> Self {
        Q::or(self, other)
    }

    fn negate(self) -> Self {
        Q::negate(self)
    }
}

/// AND a collection of filters together as a set.
///
/// Duplicates are dropped first. An empty collection yields `all()`, a single
/// distinct filter is returned unchanged, anything else is folded with `and`
/// in an unspecified order.
pub fn conjunct<F, I>(filters: I) -> F
where
    F: FilterAlgebra,
    I: IntoIterator<Item = F>,
{
    let unique: IndexSet<F> = filters.into_iter().collect();
    let mut iter = unique.into_iter();
    match iter.next() {
        None => F::all(),
        Some(first) => iter.fold(first, F::and),
    }
}
