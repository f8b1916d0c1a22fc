//! # lfb-forms
//!
//! Validation of untyped request arguments. An [`ArgsValidator`] is scoped to
//! one request: each [`ArgsValidator::validate`] call coerces one argument
//! and records the outcome, and [`ArgsValidator::is_valid_request`] reports
//! the first failure.
//!
//! ## Modules
//!
//! - [`args`] - `ArgsValidator`, `ArgSpec`, `ExpectedType`, `ValidationResult`

pub mod args;

pub use args::{ArgSpec, ArgsValidator, ExpectedType, ValidationResult};
