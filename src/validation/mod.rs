//! Validation functionality
//!
//! Provides validation logic for:
//! - Load order (referenced tables are loaded before their dependents)

pub mod load_order;

pub use load_order::{PlanValidationError, validate_load_order};
