//! Variable spaces describe how the columns of a relation are partitioned.
//!
//! Columns are laid out as domain, range, symbol and local variables followed
//! by a single constant column:
//!
//! ```text
//! [ d0 .. dn | r0 .. rm | s0 .. sk | l0 .. lj | const ]
//! ```
//!
//! Kind boundaries are derived from the per-kind counts. Every offset
//! computation goes through [`PresburgerSpace::var_kind_offset`].

use crate::utils::errors::{IndexError, IndexErrorKind, PresburgerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a variable in a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VarKind {
    /// Input tuple of the relation
    Domain,
    /// Output tuple of the relation
    Range,
    /// Parameters, constant within one relation
    Symbol,
    /// Existentially quantified variables
    Local,
}

impl VarKind {
    /// All kinds in column order.
    pub const ALL: [VarKind; 4] = [VarKind::Domain, VarKind::Range, VarKind::Symbol, VarKind::Local];

    fn index(self) -> usize {
        match self {
            VarKind::Domain => 0,
            VarKind::Range => 1,
            VarKind::Symbol => 2,
            VarKind::Local => 3,
        }
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarKind::Domain => "domain",
            VarKind::Range => "range",
            VarKind::Symbol => "symbol",
            VarKind::Local => "local",
        };
        write!(f, "{}", name)
    }
}

/// The variable counts of a relation, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresburgerSpace {
    counts: [usize; 4],
}

impl PresburgerSpace {
    /// Create a relation space with the given domain and range sizes.
    pub fn relation(num_domain: usize, num_range: usize) -> Self {
        Self::relation_with_symbols(num_domain, num_range, 0)
    }

    /// Create a relation space with symbols.
    pub fn relation_with_symbols(num_domain: usize, num_range: usize, num_symbols: usize) -> Self {
        Self::new(num_domain, num_range, num_symbols, 0)
    }

    /// Create a set space: a relation with no domain variables.
    pub fn set(num_dims: usize) -> Self {
        Self::relation(0, num_dims)
    }

    /// Create a space from all four counts.
    pub fn new(num_domain: usize, num_range: usize, num_symbols: usize, num_locals: usize) -> Self {
        Self {
            counts: [num_domain, num_range, num_symbols, num_locals],
        }
    }

    /// Get the number of variables of the given kind.
    pub fn num_vars_of_kind(&self, kind: VarKind) -> usize {
        self.counts[kind.index()]
    }

    /// Get the number of domain variables.
    pub fn num_domain_vars(&self) -> usize {
        self.num_vars_of_kind(VarKind::Domain)
    }

    /// Get the number of range variables.
    pub fn num_range_vars(&self) -> usize {
        self.num_vars_of_kind(VarKind::Range)
    }

    /// Get the number of symbol variables.
    pub fn num_symbol_vars(&self) -> usize {
        self.num_vars_of_kind(VarKind::Symbol)
    }

    /// Get the number of local (existential) variables.
    pub fn num_local_vars(&self) -> usize {
        self.num_vars_of_kind(VarKind::Local)
    }

    /// Get the number of non-local variables.
    pub fn num_dim_and_symbol_vars(&self) -> usize {
        self.var_kind_offset(VarKind::Local)
    }

    /// Get the total number of variables. The constant column is not a
    /// variable.
    pub fn num_vars(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Get the number of columns of a tableau over this space.
    pub fn num_cols(&self) -> usize {
        self.num_vars() + 1
    }

    /// Check if this is a set space (no domain variables).
    pub fn is_set(&self) -> bool {
        self.num_domain_vars() == 0
    }

    /// Absolute column of the first variable of `kind`.
    pub fn var_kind_offset(&self, kind: VarKind) -> usize {
        self.counts[..kind.index()].iter().sum()
    }

    /// Absolute column one past the last variable of `kind`.
    pub fn var_kind_end(&self, kind: VarKind) -> usize {
        self.var_kind_offset(kind) + self.num_vars_of_kind(kind)
    }

    /// Map an absolute column back to its variable kind.
    pub fn var_kind_at(&self, column: usize) -> PresburgerResult<VarKind> {
        if column == self.num_vars() {
            return Err(IndexError::new(IndexErrorKind::ConstantColumn, column, self.num_vars()).into());
        }
        VarKind::ALL
            .iter()
            .copied()
            .find(|&kind| column < self.var_kind_end(kind))
            .ok_or_else(|| IndexError::new(IndexErrorKind::Column, column, self.num_cols()).into())
    }

    /// Insert `count` variables of `kind` before intra-kind position `pos`
    /// and return the absolute column of the first inserted variable.
    pub fn insert_var(&mut self, kind: VarKind, pos: usize, count: usize) -> PresburgerResult<usize> {
        IndexError::check(IndexErrorKind::VarPosition, pos, self.num_vars_of_kind(kind) + 1)?;
        let column = self.var_kind_offset(kind) + pos;
        self.counts[kind.index()] += count;
        Ok(column)
    }

    /// Remove the variables `start..end` of `kind`.
    pub fn remove_var_range(&mut self, kind: VarKind, start: usize, end: usize) -> PresburgerResult<()> {
        let available = self.num_vars_of_kind(kind);
        IndexError::check(IndexErrorKind::VarPosition, end, available + 1)?;
        IndexError::check(IndexErrorKind::VarPosition, start, end + 1)?;
        self.counts[kind.index()] -= end - start;
        Ok(())
    }

    /// Remove the variable at intra-kind position `pos` of `kind`.
    pub fn remove_var(&mut self, kind: VarKind, pos: usize) -> PresburgerResult<()> {
        IndexError::check(IndexErrorKind::VarPosition, pos, self.num_vars_of_kind(kind))?;
        self.remove_var_range(kind, pos, pos + 1)
    }

    /// Whether domain, range and symbol counts agree. Locals may differ.
    pub fn is_compatible(&self, other: &PresburgerSpace) -> bool {
        self.counts[..3] == other.counts[..3]
    }

    /// The same space without local variables.
    pub fn without_locals(&self) -> Self {
        let mut space = *self;
        space.counts[VarKind::Local.index()] = 0;
        space
    }
}

impl fmt::Display for PresburgerSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] -> [{}]", self.num_domain_vars(), self.num_range_vars())?;
        if self.num_symbol_vars() > 0 {
            write!(f, " : {} symbols", self.num_symbol_vars())?;
        }
        if self.num_local_vars() > 0 {
            write!(f, " : {} locals", self.num_local_vars())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_space() {
        let space = PresburgerSpace::set(3);
        assert!(space.is_set());
        assert_eq!(space.num_range_vars(), 3);
        assert_eq!(space.num_cols(), 4);
    }

    #[test]
    fn test_default_space_is_degenerate() {
        let space = PresburgerSpace::default();
        assert_eq!(space.num_vars(), 0);
        assert_eq!(space.num_cols(), 1);
        assert!(space.var_kind_at(0).is_err());
    }

    #[test]
    fn test_offsets() {
        let space = PresburgerSpace::new(2, 1, 3, 2);
        assert_eq!(space.var_kind_offset(VarKind::Domain), 0);
        assert_eq!(space.var_kind_offset(VarKind::Range), 2);
        assert_eq!(space.var_kind_offset(VarKind::Symbol), 3);
        assert_eq!(space.var_kind_offset(VarKind::Local), 6);
        assert_eq!(space.var_kind_end(VarKind::Local), 8);
        assert_eq!(space.num_dim_and_symbol_vars(), 6);
    }

    #[test]
    fn test_var_kind_at_boundaries() {
        let space = PresburgerSpace::new(1, 0, 2, 1);
        assert_eq!(space.var_kind_at(0).unwrap(), VarKind::Domain);
        assert_eq!(space.var_kind_at(1).unwrap(), VarKind::Symbol);
        assert_eq!(space.var_kind_at(2).unwrap(), VarKind::Symbol);
        assert_eq!(space.var_kind_at(3).unwrap(), VarKind::Local);
        assert!(space.var_kind_at(4).is_err());
        assert!(space.var_kind_at(5).is_err());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut space = PresburgerSpace::relation(2, 2);
        assert_eq!(space.insert_var(VarKind::Local, 0, 1).unwrap(), 4);
        assert_eq!(space.insert_var(VarKind::Range, 2, 1).unwrap(), 4);
        assert_eq!(space.insert_var(VarKind::Domain, 0, 2).unwrap(), 0);
        assert_eq!(space, PresburgerSpace::new(4, 3, 0, 1));
        assert!(space.insert_var(VarKind::Symbol, 1, 1).is_err());

        space.remove_var(VarKind::Domain, 3).unwrap();
        assert!(space.remove_var(VarKind::Symbol, 0).is_err());
        space.remove_var_range(VarKind::Range, 0, 3).unwrap();
        assert_eq!(space, PresburgerSpace::new(3, 0, 0, 1));
        assert!(space.remove_var_range(VarKind::Local, 0, 2).is_err());
    }

    #[test]
    fn test_compatibility_ignores_locals() {
        let a = PresburgerSpace::new(1, 2, 0, 3);
        let b = PresburgerSpace::new(1, 2, 0, 0);
        assert!(a.is_compatible(&b));
        assert!(!a.is_compatible(&PresburgerSpace::relation(2, 1)));
        assert_eq!(a.without_locals(), b);
    }
}
