//! TokenRate Common Types
//!
//! Shared types for the conversion rate engine: currency codes, rate pairs,
//! market edges, upstream entity models and 18-digit fixed-point helpers.

pub mod fixed;
pub mod identifiers;
pub mod monetary;
pub mod rules;

pub use identifiers::*;
pub use monetary::*;
pub use rules::*;
