//! Query building.
//!
//! - [`lookups`]: `Q` predicates and field lookups
//! - [`projection`]: display-field projection
//! - [`filters`]: soft-delete and date-range strategies
//! - [`queryset`]: `Manager` and the chainable `QuerySet`
//! - [`crud`]: guarded create / update helpers on `QuerySet` and `Manager`

pub mod crud;
pub mod filters;
pub mod lookups;
pub mod projection;
pub mod queryset;

pub use filters::DateRange;
pub use lookups::{Lookup, Q};
pub use projection::Projection;
pub use queryset::{Manager, OrderBy, QuerySet};
