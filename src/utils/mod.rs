//! Utility modules for integer relations.
//!
//! This module contains common utilities used throughout the codebase:
//! - Error types
//! - Arbitrary-precision integer matrices
//! - Host coefficient buffers

pub mod errors;
pub mod matrix;
pub mod buffer;

// Re-exports
pub use errors::*;
pub use matrix::IntMatrix;
pub use buffer::{CoefficientBuffer, CoefficientRows};
