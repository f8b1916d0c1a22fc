//! Soft-delete and date-range filter strategies.
//!
//! Both strategies only build predicates; they are combined with the rest of
//! a query by [`QuerySet::range`](crate::query::queryset::QuerySet::range) and
//! [`QuerySet::existed`](crate::query::queryset::QuerySet::existed).

use lfb_core::utils::{add_days, trim_date_string, DateInput};
use lfb_core::LfbResult;

use crate::model::ModelMeta;
use crate::query::lookups::{Lookup, Q};
use crate::record::IS_DELETED;
use crate::value::Value;

/// Default day offset added to `end` when both bounds are given.
pub const DEFAULT_RANGE_DAYS: f64 = 1.5;

/// Day offset added to `end` when only `end` is given.
pub const DEFAULT_END_DAYS: f64 = 1.0;

/// The `is_deleted = false` restriction.
pub fn not_deleted() -> Q {
    Q::exact(IS_DELETED, false)
}

/// The soft-delete restriction for a model, or `None` if its records
/// carry no `is_deleted` flag.
pub fn soft_delete_q(meta: &ModelMeta) -> Option<Q> {
    meta.soft_deletable.then(not_deleted)
}

/// A date-range predicate over one timestamp field.
///
/// | start | end | predicate                                       |
/// |-------|-----|-------------------------------------------------|
/// | yes   | yes | `field__range [trim(start), end + days]`        |
/// | no    | yes | `field__lt end + end_days`                      |
/// | yes   | no  | `field__gte start`                              |
/// | no    | no  | nothing                                         |
///
/// Unless `include_deleted` is set, `is_deleted = false` is always added.
///
/// # Examples
///
/// ```
/// use lfb_db::query::filters::DateRange;
/// use lfb_db::query::lookups::{Lookup, Q};
///
/// let q = DateRange::new("created").start("2020-01-01").to_q().unwrap();
/// let keys: Vec<String> = q.conditions().into_iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, vec!["is_deleted", "created__gte"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    field: String,
    start: Option<DateInput>,
    end: Option<DateInput>,
    days: f64,
    end_days: f64,
    include_deleted: bool,
}

impl DateRange {
    /// A range over `field` with no bounds.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            start: None,
            end: None,
            days: DEFAULT_RANGE_DAYS,
            end_days: DEFAULT_END_DAYS,
            include_deleted: false,
        }
    }

    /// Sets the lower bound.
    #[must_use]
    pub fn start(mut self, start: impl Into<DateInput>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub fn end(mut self, end: impl Into<DateInput>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Sets the lower bound if present. Empty text counts as absent.
    #[must_use]
    pub fn maybe_start(self, start: Option<impl Into<DateInput>>) -> Self {
        match start.map(Into::into) {
            Some(input) if !is_blank(&input) => self.start(input),
            _ => self,
        }
    }

    /// Sets the upper bound if present. Empty text counts as absent.
    #[must_use]
    pub fn maybe_end(self, end: Option<impl Into<DateInput>>) -> Self {
        match end.map(Into::into) {
            Some(input) if !is_blank(&input) => self.end(input),
            _ => self,
        }
    }

    /// Day offset added to `end` when both bounds are given.
    #[must_use]
    pub const fn days(mut self, days: f64) -> Self {
        self.days = days;
        self
    }

    /// Day offset added to `end` when only `end` is given.
    #[must_use]
    pub const fn end_days(mut self, days: f64) -> Self {
        self.end_days = days;
        self
    }

    /// Whether soft-deleted records are kept.
    #[must_use]
    pub const fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    /// Builds the predicate.
    ///
    /// # Errors
    ///
    /// Returns [`LfbError::Data`](lfb_core::LfbError::Data) if `end` is not a
    /// valid date.
    pub fn to_q(&self) -> LfbResult<Q> {
        let mut q = Q::all();
        if !self.include_deleted {
            q = q & not_deleted();
        }

        match (&self.start, &self.end) {
            (Some(start), Some(end)) => {
                let low = Value::String(trimmed(start));
                let high = Value::String(add_days(end.clone(), self.days)?);
                q = q & Q::filter(self.field.as_str(), Lookup::Range(low, high));
            }
            (None, Some(end)) => {
                let bound = Value::String(add_days(end.clone(), self.end_days)?);
                q = q & Q::filter(self.field.as_str(), Lookup::Lt(bound));
            }
            (Some(start), None) => {
                q = q & Q::filter(self.field.as_str(), Lookup::Gte(untrimmed(start)));
            }
            (None, None) => {}
        }

        tracing::debug!(field = %self.field, conditions = ?q.conditions(), "date range predicate");
        Ok(q)
    }
}

fn is_blank(input: &DateInput) -> bool {
    matches!(input, DateInput::Text(t) if t.trim().is_empty())
}

fn trimmed(input: &DateInput) -> String {
    match input {
        DateInput::Text(text) => trim_date_string(text).to_string(),
        DateInput::DateTime(dt) => dt.date().to_string(),
    }
}

fn untrimmed(input: &DateInput) -> Value {
    match input {
        DateInput::Text(text) => Value::String(text.clone()),
        DateInput::DateTime(dt) => Value::DateTime(*dt),
    }
}
