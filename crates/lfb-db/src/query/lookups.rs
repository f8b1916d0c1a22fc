//! Query lookups and Q objects for building predicates.
//!
//! [`Lookup`] is a field-level comparison and [`Q`] combines lookups with
//! AND, OR, and NOT. A predicate is built up incrementally by the filter
//! strategies and handed to a [`RecordStore`](crate::store::RecordStore),
//! which may translate it or evaluate it directly with [`Q::matches`].
//!
//! # Examples
//!
//! ```
//! use lfb_db::query::lookups::{Q, Lookup};
//! use lfb_db::value::Value;
//!
//! // name = "Alice" AND age > 25
//! let q = Q::exact("name", "Alice") & Q::filter("age", Lookup::Gt(Value::from(25)));
//! assert_eq!(q.conditions()[1].0, "age__gt");
//!
//! // NOT(active = false)
//! let negated = !Q::exact("active", false);
//! ```

use std::cmp::Ordering;
use std::ops;

use crate::record::Record;
use crate::value::Value;

/// A field-level lookup operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match.
    Exact(Value),
    /// Case-insensitive substring match on text fields.
    IContains(String),
    /// Membership test.
    In(Vec<Value>),
    /// Greater than.
    Gt(Value),
    /// Greater than or equal.
    Gte(Value),
    /// Less than.
    Lt(Value),
    /// Less than or equal.
    Lte(Value),
    /// Inclusive range test (`low <= field <= high`).
    Range(Value, Value),
    /// NULL test; a missing field counts as NULL.
    IsNull(bool),
}

impl Lookup {
    /// The comparison-key suffix appended to the field name (`""` for exact).
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Exact(_) => "",
            Self::IContains(_) => "__icontains",
            Self::In(_) => "__in",
            Self::Gt(_) => "__gt",
            Self::Gte(_) => "__gte",
            Self::Lt(_) => "__lt",
            Self::Lte(_) => "__lte",
            Self::Range(..) => "__range",
            Self::IsNull(_) => "__isnull",
        }
    }

    /// Tests a field value against this lookup.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Exact(expected) => value.loose_eq(expected),
            Self::IContains(needle) => value
                .as_str()
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
            Self::In(options) => options.iter().any(|o| value.loose_eq(o)),
            Self::Gt(bound) => value.compare(bound) == Some(Ordering::Greater),
            Self::Gte(bound) => matches!(
                value.compare(bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt(bound) => value.compare(bound) == Some(Ordering::Less),
            Self::Lte(bound) => matches!(
                value.compare(bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Range(low, high) => {
                Self::Gte(low.clone()).matches(value) && Self::Lte(high.clone()).matches(value)
            }
            Self::IsNull(expected) => value.is_null() == *expected,
        }
    }
}

/// A composable query predicate.
///
/// `Q` objects can be combined using `&` (AND), `|` (OR), and `!` (NOT).
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single field lookup.
    Filter {
        /// The field name.
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions. An empty AND matches everything.
    And(Vec<Q>),
    /// Logical OR of multiple conditions. An empty OR matches nothing.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Shorthand for an exact-match filter.
    pub fn exact(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::filter(field, Lookup::Exact(value.into()))
    }

    /// A predicate matching every record.
    pub const fn all() -> Self {
        Self::And(Vec::new())
    }

    /// Returns `true` if this is an empty AND/OR.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }

    /// Evaluates the predicate against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Filter { field, lookup } => {
                lookup.matches(record.get(field).unwrap_or(&Value::Null))
            }
            Self::And(children) => children.iter().all(|q| q.matches(record)),
            Self::Or(children) => children.iter().any(|q| q.matches(record)),
            Self::Not(inner) => !inner.matches(record),
        }
    }

    /// Flattens the AND-reachable filters into `(comparison key, lookup)` pairs,
    /// e.g. `("created__gte", Gte("2020-01-01"))`.
    ///
    /// OR and NOT branches are not conditions of the whole predicate and are skipped.
    pub fn conditions(&self) -> Vec<(String, Lookup)> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions(&self, out: &mut Vec<(String, Lookup)>) {
        match self {
            Self::Filter { field, lookup } => {
                out.push((format!("{field}{}", lookup.suffix()), lookup.clone()));
            }
            Self::And(children) => {
                for child in children {
                    child.collect_conditions(out);
                }
            }
            Self::Or(_) | Self::Not(_) => {}
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ANDs
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ORs
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Double negation cancellation
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
