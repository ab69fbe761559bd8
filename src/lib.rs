//! # Presburger - Integer Relations over Affine Constraints
//!
//! A library for integer relations described by systems of affine
//! constraints, including:
//! - Relations with domain, range, symbol and local variables
//! - Exact integer sampling and emptiness checks (Omega test)
//! - Intersection and integer-point equality
//! - Construction from validated host coefficient buffers
//! - Generational handles for hosts that cannot hold Rust values
//!
//! ## Layout
//!
//! ```text
//! [ domain | range | symbols | locals | const ]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use presburger::prelude::*;
//!
//! // { [x] -> [y] : x + 5 >= 0, y = 2x }
//! let rel = IntegerRelation::from_coefficients::<i64, _>(
//!     &[vec![1, 0, 5]],
//!     &[vec![2, -1, 0]],
//!     1,
//!     1,
//! )?;
//! assert_eq!(rel.num_cols(), 3);
//! assert_eq!(rel.at_ineq64(0, 2)?, 5);
//! assert!(!rel.is_integer_empty()?);
//! # Ok::<(), PresburgerError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod polyhedral;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::polyhedral::{
        IntegerRelation, IntegerSampler, OmegaSampler, PresburgerSpace, RelationHandle,
        RelationStore, ReserveHint, SampleOutcome, SamplerConfig, Tableau, TableauKind, VarKind,
    };
    pub use crate::utils::buffer::CoefficientBuffer;
    pub use crate::utils::errors::*;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
