//! # lfb-core
//!
//! Core types, settings, and error types for the lfb backend toolkit.
//! This crate has no toolkit dependencies and provides the foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`utils`] - Date/time, type coercion, and list helpers
//! - [`settings`] - Backend settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML/JSON files and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{LfbError, LfbResult, ValidationError};
pub use settings::{Settings, SETTINGS};
