//! Service layer for the roster service.
//!
//! This module contains the business logic for:
//! - Generic tree rewrites (`rewrite`)
//! - Schema normalization of roster pages (`Normalizer`)

pub mod rewrite;
mod normalize;

pub use normalize::Normalizer;
pub use rewrite::{FieldCollision, Unwound};
