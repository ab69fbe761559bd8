//! Integer relations: a variable space plus equality and inequality tableaux.
//!
//! Each equality row `r` encodes `r · (x, 1) = 0` and each inequality row
//! encodes `r · (x, 1) >= 0`, where `x` ranges over all variables of the
//! space in column order and the last column holds the constant term.

use crate::polyhedral::difference;
use crate::polyhedral::sample::{IntegerSampler, OmegaSampler, SampleOutcome};
use crate::polyhedral::space::{PresburgerSpace, VarKind};
use crate::utils::buffer::CoefficientBuffer;
use crate::utils::errors::{OverflowError, PresburgerResult, ShapeError};
use crate::utils::matrix::{eval_row, IntMatrix};
use log::debug;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use std::fmt;

/// Extra capacity to reserve on top of what the supplied rows need.
///
/// Reservations never change the logical number of rows or columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReserveHint {
    /// Extra inequality rows
    pub extra_inequalities: usize,
    /// Extra equality rows
    pub extra_equalities: usize,
    /// Extra columns per row
    pub extra_cols: usize,
}

/// A system of linear equalities and inequalities over integer variables.
///
/// `PartialEq` is structural (same space, same rows in the same order); use
/// [`IntegerRelation::is_equal`] to compare the integer point sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerRelation {
    space: PresburgerSpace,
    equalities: IntMatrix,
    inequalities: IntMatrix,
}

impl IntegerRelation {
    /// Create a relation over `space` with no constraints, reserving room for
    /// the given numbers of rows and columns.
    pub fn new(
        reserved_inequalities: usize,
        reserved_equalities: usize,
        reserved_cols: usize,
        space: PresburgerSpace,
    ) -> Self {
        let n_cols = space.num_cols();
        Self {
            space,
            equalities: IntMatrix::with_reserved(n_cols, reserved_equalities, reserved_cols),
            inequalities: IntMatrix::with_reserved(n_cols, reserved_inequalities, reserved_cols),
        }
    }

    /// Create an empty relation over the default relation space (no domain or
    /// range variables) with reserved capacity only.
    pub fn with_reserved(
        reserved_inequalities: usize,
        reserved_equalities: usize,
        reserved_cols: usize,
    ) -> Self {
        Self::new(
            reserved_inequalities,
            reserved_equalities,
            reserved_cols,
            PresburgerSpace::default(),
        )
    }

    /// The unconstrained relation over `space`.
    pub fn universe(space: PresburgerSpace) -> Self {
        Self::new(0, 0, space.num_cols(), space)
    }

    /// Build a relation from coefficient rows. Every row must have
    /// `num_domain + num_range + 1` entries; nothing is allocated otherwise.
    pub fn from_coefficients<T, R>(
        inequalities: &[R],
        equalities: &[R],
        num_domain: usize,
        num_range: usize,
    ) -> PresburgerResult<Self>
    where
        T: Clone + Into<BigInt>,
        R: AsRef<[T]>,
    {
        Self::from_coefficients_with_reserve(
            inequalities,
            equalities,
            num_domain,
            num_range,
            ReserveHint::default(),
        )
    }

    /// Like [`IntegerRelation::from_coefficients`], reserving extra capacity.
    pub fn from_coefficients_with_reserve<T, R>(
        inequalities: &[R],
        equalities: &[R],
        num_domain: usize,
        num_range: usize,
        reserve: ReserveHint,
    ) -> PresburgerResult<Self>
    where
        T: Clone + Into<BigInt>,
        R: AsRef<[T]>,
    {
        let space = PresburgerSpace::relation(num_domain, num_range);
        let n_cols = space.num_cols();
        if let Some(bad) = inequalities
            .iter()
            .chain(equalities)
            .find(|row| row.as_ref().len() != n_cols)
        {
            return Err(ShapeError::row_length(n_cols, bad.as_ref().len()).into());
        }

        let mut relation = Self::new(
            inequalities.len() + reserve.extra_inequalities,
            equalities.len() + reserve.extra_equalities,
            n_cols + reserve.extra_cols,
            space,
        );
        for row in inequalities {
            relation.add_inequality(row.as_ref())?;
        }
        for row in equalities {
            relation.add_equality(row.as_ref())?;
        }
        debug!(
            "created relation {} with {} inequalities and {} equalities",
            relation.space,
            relation.num_inequalities(),
            relation.num_equalities()
        );
        Ok(relation)
    }

    /// Build a relation from two host buffers of row-major `i64`
    /// coefficients. Both buffers are validated before any row is read.
    pub fn from_buffers(
        inequalities: &CoefficientBuffer<'_>,
        equalities: &CoefficientBuffer<'_>,
        num_domain: usize,
        num_range: usize,
    ) -> PresburgerResult<Self> {
        let ineq = inequalities.validate()?;
        let eq = equalities.validate()?;
        let n_cols = num_domain + num_range + 1;
        if ineq.n_cols != eq.n_cols {
            return Err(ShapeError::column_count(ineq.n_cols, eq.n_cols).into());
        }
        if eq.n_cols != n_cols {
            return Err(ShapeError::column_count(n_cols, eq.n_cols).into());
        }
        let ineq_rows: Vec<&[i64]> = ineq.rows().collect();
        let eq_rows: Vec<&[i64]> = eq.rows().collect();
        Self::from_coefficients::<i64, _>(&ineq_rows[..], &eq_rows[..], num_domain, num_range)
    }

    /// Get the variable space.
    pub fn space(&self) -> &PresburgerSpace {
        &self.space
    }

    /// Get the number of columns, the constant column included.
    pub fn num_cols(&self) -> usize {
        self.space.num_cols()
    }

    /// Get the number of variables of all kinds.
    pub fn num_vars(&self) -> usize {
        self.space.num_vars()
    }

    /// Get the number of inequality rows.
    pub fn num_inequalities(&self) -> usize {
        self.inequalities.n_rows()
    }

    /// Get the number of equality rows.
    pub fn num_equalities(&self) -> usize {
        self.equalities.n_rows()
    }

    /// Get the number of equalities plus inequalities.
    pub fn num_constraints(&self) -> usize {
        self.num_inequalities() + self.num_equalities()
    }

    /// Get the number of domain variables.
    pub fn num_domain_vars(&self) -> usize {
        self.space.num_domain_vars()
    }

    /// Get the number of range variables.
    pub fn num_range_vars(&self) -> usize {
        self.space.num_range_vars()
    }

    /// Get the number of symbol variables.
    pub fn num_symbol_vars(&self) -> usize {
        self.space.num_symbol_vars()
    }

    /// Get the number of local variables.
    pub fn num_local_vars(&self) -> usize {
        self.space.num_local_vars()
    }

    /// Get the kind of the variable in an absolute column.
    pub fn var_kind_at(&self, column: usize) -> PresburgerResult<VarKind> {
        self.space.var_kind_at(column)
    }

    /// Get the equality tableau.
    pub fn equality_matrix(&self) -> &IntMatrix {
        &self.equalities
    }

    /// Get the inequality tableau.
    pub fn inequality_matrix(&self) -> &IntMatrix {
        &self.inequalities
    }

    /// A read-only view of the equalities.
    pub fn equalities(&self) -> Tableau<'_> {
        Tableau::new(&self.equalities, TableauKind::Equalities)
    }

    /// A read-only view of the inequalities.
    pub fn inequalities(&self) -> Tableau<'_> {
        Tableau::new(&self.inequalities, TableauKind::Inequalities)
    }

    /// Get an equality coefficient.
    pub fn at_eq(&self, row: usize, col: usize) -> PresburgerResult<&BigInt> {
        self.equalities.at(row, col)
    }

    /// Get an inequality coefficient.
    pub fn at_ineq(&self, row: usize, col: usize) -> PresburgerResult<&BigInt> {
        self.inequalities.at(row, col)
    }

    /// Get an equality coefficient as `i64`, failing if it does not fit.
    pub fn at_eq64(&self, row: usize, col: usize) -> PresburgerResult<i64> {
        narrow(self.at_eq(row, col)?)
    }

    /// Get an inequality coefficient as `i64`, failing if it does not fit.
    pub fn at_ineq64(&self, row: usize, col: usize) -> PresburgerResult<i64> {
        narrow(self.at_ineq(row, col)?)
    }

    /// Overwrite one equality coefficient.
    pub fn set_at_eq(&mut self, row: usize, col: usize, value: impl Into<BigInt>) -> PresburgerResult<()> {
        self.equalities.set(row, col, value)
    }

    /// Overwrite one inequality coefficient.
    pub fn set_at_ineq(&mut self, row: usize, col: usize, value: impl Into<BigInt>) -> PresburgerResult<()> {
        self.inequalities.set(row, col, value)
    }

    /// Get an equality row.
    pub fn equality(&self, row: usize) -> PresburgerResult<&[BigInt]> {
        self.equalities.row(row)
    }

    /// Get an inequality row.
    pub fn inequality(&self, row: usize) -> PresburgerResult<&[BigInt]> {
        self.inequalities.row(row)
    }

    /// Get an equality row as `i64` values.
    pub fn equality64(&self, row: usize) -> PresburgerResult<Vec<i64>> {
        self.equalities().row64(row)
    }

    /// Get an inequality row as `i64` values.
    pub fn inequality64(&self, row: usize) -> PresburgerResult<Vec<i64>> {
        self.inequalities().row64(row)
    }

    /// Append the equality `coefficients · (x, 1) = 0`.
    pub fn add_equality<T: Clone + Into<BigInt>>(&mut self, coefficients: &[T]) -> PresburgerResult<usize> {
        self.equalities.add_row(coefficients)
    }

    /// Append the inequality `coefficients · (x, 1) >= 0`.
    pub fn add_inequality<T: Clone + Into<BigInt>>(&mut self, coefficients: &[T]) -> PresburgerResult<usize> {
        self.inequalities.add_row(coefficients)
    }

    /// Remove an equality row; later rows move up by one.
    pub fn remove_equality(&mut self, row: usize) -> PresburgerResult<()> {
        self.equalities.remove_row(row)
    }

    /// Remove an inequality row; later rows move up by one.
    pub fn remove_inequality(&mut self, row: usize) -> PresburgerResult<()> {
        self.inequalities.remove_row(row)
    }

    /// Insert `count` variables of `kind` before intra-kind position `pos`.
    /// Existing coefficients keep their values; the new columns are zero.
    /// Returns the absolute column of the first new variable.
    pub fn insert_var(&mut self, kind: VarKind, pos: usize, count: usize) -> PresburgerResult<usize> {
        let mut space = self.space;
        let column = space.insert_var(kind, pos, count)?;
        self.equalities.insert_columns(column, count)?;
        self.inequalities.insert_columns(column, count)?;
        self.space = space;
        Ok(column)
    }

    /// Append `count` variables after the existing variables of `kind`.
    pub fn append_var(&mut self, kind: VarKind, count: usize) -> PresburgerResult<usize> {
        let pos = self.space.num_vars_of_kind(kind);
        self.insert_var(kind, pos, count)
    }

    /// Remove the variables `start..end` of `kind` together with their
    /// columns.
    pub fn remove_var_range(&mut self, kind: VarKind, start: usize, end: usize) -> PresburgerResult<()> {
        let mut space = self.space;
        space.remove_var_range(kind, start, end)?;
        let column = self.space.var_kind_offset(kind) + start;
        self.equalities.remove_columns(column, end - start)?;
        self.inequalities.remove_columns(column, end - start)?;
        self.space = space;
        Ok(())
    }

    /// Remove the variable at intra-kind position `pos`.
    pub fn remove_var(&mut self, kind: VarKind, pos: usize) -> PresburgerResult<()> {
        let mut space = self.space;
        space.remove_var(kind, pos)?;
        self.remove_var_range(kind, pos, pos + 1)
    }

    /// Append all constraints of `other`, which must have the same space.
    pub fn append(&mut self, other: &IntegerRelation) -> PresburgerResult<()> {
        if self.space != other.space {
            return Err(ShapeError::incompatible_spaces(self.space, other.space).into());
        }
        self.equalities
            .reserve_rows(self.num_equalities() + other.num_equalities());
        self.inequalities
            .reserve_rows(self.num_inequalities() + other.num_inequalities());
        for row in other.equalities.rows() {
            self.equalities.add_row(row)?;
        }
        for row in other.inequalities.rows() {
            self.inequalities.add_row(row)?;
        }
        Ok(())
    }

    /// Return the intersection of the two relations.
    ///
    /// Domain, range and symbol counts must match. The locals of both
    /// operands are kept as distinct locals of the result (`self`'s first);
    /// they are never merged.
    pub fn intersect(&self, other: &IntegerRelation) -> PresburgerResult<IntegerRelation> {
        if !self.space.is_compatible(&other.space) {
            return Err(ShapeError::incompatible_spaces(self.space, other.space).into());
        }
        let mut result = self.clone();
        result.append_var(VarKind::Local, other.num_local_vars())?;
        let mut rhs = other.clone();
        rhs.insert_var(VarKind::Local, 0, self.num_local_vars())?;
        result.append(&rhs)?;
        debug!(
            "intersected {} with {}: {} constraints",
            self.space,
            other.space,
            result.num_constraints()
        );
        Ok(result)
    }

    /// Whether the two relations contain exactly the same integer points.
    ///
    /// This is exact and potentially expensive: it runs the integer emptiness
    /// check on `self \ other` and `other \ self`.
    pub fn is_equal(&self, other: &IntegerRelation) -> PresburgerResult<bool> {
        self.is_equal_with(other, &OmegaSampler::default())
    }

    /// Like [`IntegerRelation::is_equal`] with a caller-provided sampler.
    pub fn is_equal_with<S: IntegerSampler + ?Sized>(
        &self,
        other: &IntegerRelation,
        sampler: &S,
    ) -> PresburgerResult<bool> {
        if !self.space.is_compatible(&other.space) {
            return Err(ShapeError::incompatible_spaces(self.space, other.space).into());
        }
        Ok(difference::is_subset(self, other, sampler)? && difference::is_subset(other, self, sampler)?)
    }

    /// Whether every integer point of `self` is a point of `other`.
    pub fn is_subset_of(&self, other: &IntegerRelation) -> PresburgerResult<bool> {
        self.is_subset_of_with(other, &OmegaSampler::default())
    }

    /// Like [`IntegerRelation::is_subset_of`] with a caller-provided sampler.
    pub fn is_subset_of_with<S: IntegerSampler + ?Sized>(
        &self,
        other: &IntegerRelation,
        sampler: &S,
    ) -> PresburgerResult<bool> {
        if !self.space.is_compatible(&other.space) {
            return Err(ShapeError::incompatible_spaces(self.space, other.space).into());
        }
        difference::is_subset(self, other, sampler)
    }

    /// Find an integer point satisfying every constraint. The point assigns a
    /// value to every variable, locals included.
    pub fn find_integer_sample(&self) -> PresburgerResult<Option<Vec<BigInt>>> {
        match OmegaSampler::default().sample(self)? {
            SampleOutcome::Point(point) => Ok(Some(point)),
            SampleOutcome::Empty => Ok(None),
        }
    }

    /// Whether the relation contains no integer point.
    pub fn is_integer_empty(&self) -> PresburgerResult<bool> {
        Ok(OmegaSampler::default().sample(self)?.is_empty())
    }

    /// Whether `point` (one value per variable) satisfies every constraint.
    pub fn contains_point(&self, point: &[BigInt]) -> PresburgerResult<bool> {
        if point.len() != self.num_vars() {
            return Err(ShapeError::point_length(self.num_vars(), point.len()).into());
        }
        let eqs_hold = self.equalities.rows().all(|row| eval_row(row, point).is_zero());
        let ineqs_hold = self
            .inequalities
            .rows()
            .all(|row| !eval_row(row, point).is_negative());
        Ok(eqs_hold && ineqs_hold)
    }

    /// Print the relation to stderr.
    pub fn dump(&self) {
        eprintln!("{}", self);
    }
}

impl fmt::Display for IntegerRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Domain: {}, Range: {}, Symbols: {}, Locals: {}",
            self.num_domain_vars(),
            self.num_range_vars(),
            self.num_symbol_vars(),
            self.num_local_vars()
        )?;
        writeln!(f, "{} constraints", self.num_constraints())?;
        for (rows, relation) in [(&self.equalities, "= 0"), (&self.inequalities, ">= 0")] {
            for row in rows.rows() {
                for val in row {
                    write!(f, "{} ", val)?;
                }
                writeln!(f, "{}", relation)?;
            }
        }
        Ok(())
    }
}

fn narrow(value: &BigInt) -> PresburgerResult<i64> {
    value.to_i64().ok_or_else(|| {
        OverflowError {
            value: value.clone(),
        }
        .into()
    })
}

/// Which of the two tableaux a [`Tableau`] views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableauKind {
    /// Rows are `= 0` constraints
    Equalities,
    /// Rows are `>= 0` constraints
    Inequalities,
}

/// A read-only view of one tableau of a relation.
#[derive(Debug, Clone, Copy)]
pub struct Tableau<'a> {
    matrix: &'a IntMatrix,
    kind: TableauKind,
}

impl<'a> Tableau<'a> {
    fn new(matrix: &'a IntMatrix, kind: TableauKind) -> Self {
        Self { matrix, kind }
    }

    /// Which constraint kind the rows encode.
    pub fn kind(&self) -> TableauKind {
        self.kind
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.matrix.n_rows()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.matrix.n_cols()
    }

    /// Get an element.
    pub fn at(&self, row: usize, col: usize) -> PresburgerResult<&'a BigInt> {
        self.matrix.at(row, col)
    }

    /// Get an element as `i64`.
    pub fn at64(&self, row: usize, col: usize) -> PresburgerResult<i64> {
        narrow(self.matrix.at(row, col)?)
    }

    /// Get a whole row as `i64` values.
    pub fn row64(&self, row: usize) -> PresburgerResult<Vec<i64>> {
        self.matrix.row(row)?.iter().map(narrow).collect()
    }
}
