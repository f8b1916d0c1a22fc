//! Request argument validation.
//!
//! Each argument is checked in a fixed order, and the first failure sets its
//! message:
//!
//! 1. Missing: absent or empty and nulls are not allowed -> `"{field} missing."`
//! 2. Coercion to the [`ExpectedType`] -> `"{field} type error."`
//! 3. The sentinels `"None"` and `"null"` become absence.
//! 4. Choices: a present value outside the choices -> `"{field} value error."`
//! 5. An absent value takes the default, if any.
//!
//! Outcomes accumulate on the validator; nothing here returns early.

use std::fmt;

use lfb_core::utils::{is_null_sentinel, str_to_bool};
use lfb_core::ValidationError;
use lfb_db::Value;
use lfb_http::QueryDict;

/// The kind an argument is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpectedType {
    /// A 64-bit integer.
    Integer,
    /// A 64-bit float.
    Float,
    /// Text, taken as is.
    String,
    /// `"true"`, `"True"`, or `"1"` is true; anything else is false.
    Boolean,
    /// Any JSON document.
    Json,
    /// A JSON array.
    List,
    /// A JSON object.
    Dict,
}

impl ExpectedType {
    /// Lowercase name used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Json => "json",
            Self::List => "list",
            Self::Dict => "dict",
        }
    }

    /// Returns `true` for the kinds decoded as JSON.
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json | Self::List | Self::Dict)
    }

    /// Coerces raw text, or `None` if it does not convert.
    ///
    /// Sentinels are not special here; a JSON `null` decodes to `Value::Null`.
    pub fn coerce(self, raw: &str) -> Option<Value> {
        match self {
            Self::Integer => raw.trim().parse::<i64>().ok().map(Value::Int),
            Self::Float => raw.trim().parse::<f64>().ok().map(Value::Float),
            Self::String => Some(Value::String(raw.to_string())),
            Self::Boolean => Some(Value::Bool(str_to_bool(raw))),
            Self::Json | Self::List | Self::Dict => {
                let decoded: serde_json::Value = serde_json::from_str(raw).ok()?;
                match (self, &decoded) {
                    (_, serde_json::Value::Null) => Some(Value::Null),
                    (Self::List, serde_json::Value::Array(_))
                    | (Self::Dict, serde_json::Value::Object(_))
                    | (Self::Json, _) => Some(Value::Json(decoded)),
                    _ => None,
                }
            }
        }
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Description of one expected argument.
///
/// # Examples
///
/// ```
/// use lfb_forms::{ArgSpec, ExpectedType};
///
/// let spec = ArgSpec::new("order")
///     .expect(ExpectedType::Integer)
///     .choices([1, -1])
///     .default(1);
/// assert!(spec.allows_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    key: String,
    default: Option<Value>,
    expected: Option<ExpectedType>,
    allow_null: bool,
    choices: Option<Vec<Value>>,
    note: String,
}

impl ArgSpec {
    /// An optional, untyped argument.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default: None,
            expected: None,
            allow_null: true,
            choices: None,
            note: String::new(),
        }
    }

    /// Sets the expected kind.
    #[must_use]
    pub fn expect(mut self, expected: ExpectedType) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Rejects a missing or empty value.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.allow_null = false;
        self
    }

    /// Value used when the argument is absent.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts a present value to `choices`.
    #[must_use]
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// A free-form description of the argument.
    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// The argument name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The free-form description set with [`note`](Self::note).
    pub fn description(&self) -> &str {
        &self.note
    }

    /// Returns `true` if a missing value is accepted.
    pub const fn allows_null(&self) -> bool {
        self.allow_null
    }
}

/// Outcome of validating one argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// The argument name.
    pub field: String,
    /// The coerced value, after default substitution.
    pub value: Option<Value>,
    /// Whether the argument is valid.
    pub valid: bool,
    /// The failure message, empty when valid.
    pub message: String,
    /// A machine-readable failure code (`missing`, `type_error`, `value_error`).
    pub code: Option<&'static str>,
}

impl ValidationResult {
    fn ok(field: &str, value: Option<Value>) -> Self {
        Self {
            field: field.to_string(),
            value,
            valid: true,
            message: String::new(),
            code: None,
        }
    }

    fn fail(field: &str, value: Option<Value>, code: &'static str, message: String) -> Self {
        Self {
            field: field.to_string(),
            value,
            valid: false,
            message,
            code: Some(code),
        }
    }
}

enum Coerced {
    Value(Option<Value>),
    TypeError,
}

/// Validates the arguments of one request.
///
/// # Examples
///
/// ```
/// use lfb_forms::{ArgSpec, ArgsValidator, ExpectedType};
/// use lfb_http::QueryDict;
/// use lfb_db::Value;
///
/// let args = QueryDict::parse("age=abc&name=ops");
/// let mut validator = ArgsValidator::new(&args);
///
/// let name = validator.validate(&ArgSpec::new("name").required());
/// let age = validator.validate(&ArgSpec::new("age").expect(ExpectedType::Integer).required());
///
/// assert_eq!(name, Some(Value::from("ops")));
/// assert_eq!(age, None);
/// assert_eq!(validator.is_valid_request(), (false, "age type error.".to_string()));
/// ```
#[derive(Debug)]
pub struct ArgsValidator<'a> {
    args: &'a QueryDict,
    results: Vec<ValidationResult>,
}

impl<'a> ArgsValidator<'a> {
    /// A validator over one request's arguments.
    pub const fn new(args: &'a QueryDict) -> Self {
        Self {
            args,
            results: Vec::new(),
        }
    }

    /// Validates one argument, records the outcome, and returns the value.
    ///
    /// Returns `None` when the argument is absent without a default, or invalid.
    pub fn validate(&mut self, spec: &ArgSpec) -> Option<Value> {
        let result = self.evaluate(spec, spec.expected);
        self.record(result)
    }

    /// Like [`validate`](Self::validate), but tries each type in `types` in
    /// order and accepts the first that converts and passes the choices.
    ///
    /// If none does, the argument is invalid with
    /// `"{field} type error, expected one of: a, b."`.
    pub fn multi_type_args(&mut self, spec: &ArgSpec, types: &[ExpectedType]) -> Option<Value> {
        if types.is_empty() {
            return self.validate(spec);
        }
        let mut attempts = types.iter().map(|t| self.evaluate(spec, Some(*t)));
        let result = match attempts.find(|r| r.valid) {
            Some(accepted) => accepted,
            None => {
                let names: Vec<&str> = types.iter().map(|t| t.name()).collect();
                let first = self.evaluate(spec, types.first().copied());
                if first.code == Some("missing") {
                    first
                } else {
                    ValidationResult::fail(
                        &spec.key,
                        None,
                        "type_error",
                        format!(
                            "{} type error, expected one of: {}.",
                            spec.key,
                            names.join(", ")
                        ),
                    )
                }
            }
        };
        self.record(result)
    }

    /// `(true, "")` if every argument is valid, else `(false, first failure message)`.
    pub fn is_valid_request(&self) -> (bool, String) {
        self.first_failure()
            .map_or_else(|| (true, String::new()), |r| (false, r.message.clone()))
    }

    /// Like [`is_valid_request`](Self::is_valid_request), as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the first failure as a [`ValidationError`] naming its field.
    pub fn check(&self) -> Result<(), ValidationError> {
        match self.first_failure() {
            None => Ok(()),
            Some(r) => Err(ValidationError::new(
                r.message.clone(),
                r.code.unwrap_or("invalid"),
            )
            .with_field(r.field.clone())),
        }
    }

    /// Every recorded outcome, in call order.
    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    fn first_failure(&self) -> Option<&ValidationResult> {
        self.results.iter().find(|r| !r.valid)
    }

    fn record(&mut self, result: ValidationResult) -> Option<Value> {
        if !result.valid {
            tracing::debug!(field = %result.field, message = %result.message, "invalid argument");
        }
        let value = if result.valid { result.value.clone() } else { None };
        self.results.push(result);
        value
    }

    fn evaluate(&self, spec: &ArgSpec, expected: Option<ExpectedType>) -> ValidationResult {
        let key = spec.key.as_str();
        let raw = self.args.get(key).filter(|s| !s.is_empty());

        let Some(raw) = raw else {
            if !spec.allow_null {
                return ValidationResult::fail(key, None, "missing", format!("{key} missing."));
            }
            return ValidationResult::ok(key, spec.default.clone());
        };

        let value = match Self::coerce(raw, expected) {
            Coerced::Value(value) => value,
            Coerced::TypeError => {
                return ValidationResult::fail(
                    key,
                    None,
                    "type_error",
                    format!("{key} type error."),
                );
            }
        };

        if let (Some(v), Some(choices)) = (&value, &spec.choices) {
            if !choices.iter().any(|c| v.loose_eq(c)) {
                return ValidationResult::fail(
                    key,
                    value.clone(),
                    "value_error",
                    format!("{key} value error."),
                );
            }
        }

        ValidationResult::ok(key, value.or_else(|| spec.default.clone()))
    }

    fn coerce(raw: &str, expected: Option<ExpectedType>) -> Coerced {
        let coerced = match expected {
            None => Some(Value::String(raw.to_string())),
            Some(t) => t.coerce(raw),
        };
        match coerced {
            None => Coerced::TypeError,
            Some(Value::Null) => Coerced::Value(None),
            Some(Value::String(s)) if is_null_sentinel(&s) => Coerced::Value(None),
            Some(v) => Coerced::Value(Some(v)),
        }
    }
}
