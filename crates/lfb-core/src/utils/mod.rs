//! Utility functions for the lfb backend.
//!
//! This module provides:
//! - [`datetime`]: ISO 8601 trimming, day arithmetic, and parsing.
//! - [`types`]: textual coercions for untyped request data.
//! - [`lists`]: order-preserving intersection and union.

pub mod datetime;
pub mod lists;
pub mod types;

pub use datetime::{add_days, parse_datetime, trim_date_string, DateInput};
pub use lists::{intersection, union};
pub use types::{is_null_sentinel, str_to_bool};
