//! Error types for integer relations.
//!
//! Every failure in this crate is local and recoverable: it is reported to the
//! immediate caller before any state is mutated. The errors are organized by
//! the kind of contract that was violated.

use crate::polyhedral::handle::RelationHandle;
use num_bigint::BigInt;
use std::fmt;
use thiserror::Error;

/// Top-level error type for relation operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresburgerError {
    /// Row length, column count or space mismatch
    #[error("Shape mismatch: {0}")]
    Shape(#[from] ShapeError),

    /// Row, column or variable position outside live bounds
    #[error("Index out of range: {0}")]
    Index(#[from] IndexError),

    /// A stored value does not fit the requested fixed-width type
    #[error("Overflow: {0}")]
    Overflow(#[from] OverflowError),

    /// An external coefficient buffer has the wrong layout
    #[error("Unsupported buffer: {0}")]
    Buffer(#[from] BufferError),

    /// The operation is not supported for this relation
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The sampler ran out of its step budget before reaching a verdict
    #[error("Sampler budget of {steps} steps exhausted")]
    BudgetExhausted {
        /// The configured budget
        steps: u64,
    },

    /// A handle was used after it was released
    #[error("Stale relation handle {0}")]
    StaleHandle(RelationHandle),
}

/// Mismatch between the shape of some input and what the relation expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    /// The error message
    pub message: String,
    /// The kind of shape error
    pub kind: ShapeErrorKind,
}

impl ShapeError {
    /// Create a row-length error.
    pub fn row_length(expected: usize, found: usize) -> Self {
        Self {
            message: format!("expected a row of {} coefficients, got {}", expected, found),
            kind: ShapeErrorKind::RowLength,
        }
    }

    /// Create a column-count error between two matrices or buffers.
    pub fn column_count(expected: usize, found: usize) -> Self {
        Self {
            message: format!("expected {} columns, got {}", expected, found),
            kind: ShapeErrorKind::ColumnCount,
        }
    }

    /// Create an error for a point with the wrong number of values.
    pub fn point_length(expected: usize, found: usize) -> Self {
        Self {
            message: format!("expected a point with {} values, got {}", expected, found),
            kind: ShapeErrorKind::PointLength,
        }
    }

    /// Create an incompatible-space error.
    pub fn incompatible_spaces(lhs: impl fmt::Display, rhs: impl fmt::Display) -> Self {
        Self {
            message: format!("spaces {} and {} are not compatible", lhs, rhs),
            kind: ShapeErrorKind::IncompatibleSpaces,
        }
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// What shape check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeErrorKind {
    /// A row does not have one coefficient per column
    RowLength,
    /// Two matrices or buffers disagree on the column count
    ColumnCount,
    /// Domain, range or symbol counts differ between operands
    IncompatibleSpaces,
    /// A point does not have one value per variable
    PointLength,
}

/// An index outside the live bounds of a matrix or space.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct IndexError {
    /// The offending index
    pub index: usize,
    /// The exclusive upper bound that was violated
    pub bound: usize,
    /// What was being indexed
    pub kind: IndexErrorKind,
}

impl IndexError {
    /// Create a new index error.
    pub fn new(kind: IndexErrorKind, index: usize, bound: usize) -> Self {
        Self { index, bound, kind }
    }

    /// Fail unless `index < bound`.
    pub fn check(kind: IndexErrorKind, index: usize, bound: usize) -> Result<(), Self> {
        if index < bound {
            Ok(())
        } else {
            Err(Self::new(kind, index, bound))
        }
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            IndexErrorKind::Row => "row",
            IndexErrorKind::Column => "column",
            IndexErrorKind::VarPosition => "variable position",
            IndexErrorKind::ConstantColumn => "constant column",
        };
        write!(f, "{} {} is out of range (bound {})", what, self.index, self.bound)
    }
}

/// Which index was out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorKind {
    /// Row of a coefficient matrix
    Row,
    /// Column of a coefficient matrix
    Column,
    /// Position of a variable within its kind
    VarPosition,
    /// The constant column was used where a variable was expected
    ConstantColumn,
}

/// A value that does not fit in a 64-bit signed integer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct OverflowError {
    /// The exact value that was read
    pub value: BigInt,
}

impl fmt::Display for OverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value {} does not fit in a 64-bit integer", self.value)
    }
}

/// An external coefficient buffer that cannot be read as row-major `i64`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct BufferError {
    /// The error message
    pub message: String,
    /// The kind of buffer error
    pub kind: BufferErrorKind,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Which buffer check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferErrorKind {
    /// Strides do not describe a row-major contiguous layout
    NotContiguous,
    /// Element type is not a signed 64-bit integer
    Format,
    /// Buffer is not two-dimensional
    Rank,
    /// Byte length disagrees with the shape
    Length,
}

/// Result type using PresburgerError.
pub type PresburgerResult<T> = Result<T, PresburgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: PresburgerError = ShapeError::row_length(4, 3).into();
        let s = format!("{}", err);
        assert!(s.contains("Shape mismatch"));
        assert!(s.contains("4 coefficients, got 3"));

        let err: PresburgerError = IndexError::new(IndexErrorKind::Column, 7, 3).into();
        assert_eq!(
            format!("{}", err),
            "Index out of range: column 7 is out of range (bound 3)"
        );
    }

    #[test]
    fn test_index_check() {
        assert!(IndexError::check(IndexErrorKind::Row, 0, 1).is_ok());
        let err = IndexError::check(IndexErrorKind::Row, 1, 1).unwrap_err();
        assert_eq!(err.kind, IndexErrorKind::Row);
    }
}
