//! Field values for records and query predicates.
//!
//! The [`Value`] enum is the type used throughout the toolkit to represent
//! record fields, predicate operands, and validated request arguments.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lfb_core::utils::datetime::{parse_datetime, ISO_FORMAT};

/// A storage-agnostic field value.
///
/// # Examples
///
/// ```
/// use lfb_db::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v, Value::String("hello".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// A date without time.
    Date(NaiveDate),
    /// A date and time without timezone.
    DateTime(NaiveDateTime),
    /// A structured JSON value (decoded `json`/`list`/`dict` arguments).
    Json(serde_json::Value),
    /// A list of values (for `in` lookups and flat value lists).
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format(ISO_FORMAT)),
            Self::Json(j) => write!(f, "{j}"),
            Self::List(vals) => {
                write!(f, "[")?;
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s.clone()),
            Value::Date(d) => Self::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Self::String(dt.format(ISO_FORMAT).to_string()),
            Value::Json(j) => j.clone(),
            Value::List(vals) => Self::Array(vals.iter().map(Self::from).collect()),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl Value {
    /// Returns `true` if this value is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for values a caller would consider "set": not null,
    /// not `false`, not zero, not an empty string or list.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::List(vals) => !vals.is_empty(),
            Self::Json(j) => !matches!(j, serde_json::Value::Null | serde_json::Value::Bool(false)),
            Self::Date(_) | Self::DateTime(_) => true,
        }
    }

    /// Attempts to extract a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as plain text, as it would be written into a string field.
    ///
    /// Strings are returned without quoting; `Null` becomes `"None"`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => "None".to_string(),
            other => other.to_string(),
        }
    }

    fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Self::DateTime(dt) => Some(*dt),
            Self::String(s) => parse_datetime(s),
            _ => None,
        }
    }

    const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date(_) | Self::DateTime(_))
    }

    /// Compares two values, or `None` if they are not comparable.
    ///
    /// Numbers compare across `Int`/`Float`. When either side is a date or
    /// datetime, the other side may be ISO 8601 text; a bare date compares as
    /// midnight.
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use chrono::NaiveDate;
    /// use lfb_db::value::Value;
    ///
    /// let created = Value::from(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
    /// assert_eq!(created.compare(&Value::from("2020-01-01")), Some(Ordering::Greater));
    /// ```
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (a, b) if a.is_temporal() || b.is_temporal() => {
                Some(a.as_datetime()?.cmp(&b.as_datetime()?))
            }
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Equality used by `exact` lookups: structural equality, or ordering-equal
    /// for values of different but comparable kinds (`1` and `1.0`).
    pub fn loose_eq(&self, other: &Self) -> bool {
        self == other || self.compare(other) == Some(Ordering::Equal)
    }
}
