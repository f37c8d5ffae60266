//! Shared utilities: delay formatting and topology validation.

pub mod duration;
pub mod validation;

pub use duration::{format_delay, format_rtt};
pub use validation::{validate_tier_invariants, validate_tree};
