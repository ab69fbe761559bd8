//! Subset checks via set difference.
//!
//! `A ⊆ B` holds iff `A \ B` has no integer point. The complement of `B` is
//! the union of the negations of its constraints, so `A \ B` is a union of
//! pieces, each `A` plus one negated constraint of `B`. An equality `e = 0`
//! negates to the two pieces `e >= 1` and `e <= -1`.
//!
//! Locals of `B` are existential. Negating a constraint over them is only
//! sound when each local is a function of the other variables, so every local
//! of `B` must have a division representation `q = floor(e / c)`. These are
//! recovered from the constraints of `B` and added to every piece as the
//! inequalities `e - c*q >= 0` and `c*q - e + c - 1 >= 0`.

use crate::polyhedral::relation::IntegerRelation;
use crate::polyhedral::sample::IntegerSampler;
use crate::polyhedral::space::VarKind;
use crate::utils::errors::{PresburgerError, PresburgerResult};
use log::debug;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

/// A local variable expressed as `floor(dividend / divisor)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionRepr {
    /// Position of the local among the relation's locals
    pub local: usize,
    /// Coefficients over the relation's columns, constant last. Only refers
    /// to non-local variables and locals defined earlier.
    pub dividend: Vec<BigInt>,
    /// Positive divisor
    pub divisor: BigInt,
}

/// Recover a division representation for every local of `rel`, in an order
/// where each only depends on earlier ones.
///
/// A local is defined by an equality `a*q + e = 0`, by a pair of
/// inequalities `e - c*q >= 0`, `c*q - e + k >= 0` with `0 <= k < c`, or is
/// unconstrained. Any other local makes the operation unsupported.
pub fn division_representations(rel: &IntegerRelation) -> PresburgerResult<Vec<DivisionRepr>> {
    let n_locals = rel.num_local_vars();
    let mut known = vec![false; n_locals];
    let mut reprs = Vec::with_capacity(n_locals);

    while reprs.len() < n_locals {
        let mut progress = false;
        for local in 0..n_locals {
            if known[local] {
                continue;
            }
            if let Some(repr) = find_repr(rel, local, &known) {
                known[local] = true;
                reprs.push(repr);
                progress = true;
            }
        }
        if !progress {
            let stuck = known.iter().position(|k| !k).unwrap_or_default();
            return Err(PresburgerError::Unsupported(format!(
                "local variable {} has no division representation",
                stuck
            )));
        }
    }
    Ok(reprs)
}

fn find_repr(rel: &IntegerRelation, local: usize, known: &[bool]) -> Option<DivisionRepr> {
    let offset = rel.space().var_kind_offset(VarKind::Local);
    let n_cols = rel.num_cols();
    let constant = n_cols - 1;
    let q = offset + local;
    let defined_by_known = |row: &[BigInt]| {
        known
            .iter()
            .enumerate()
            .all(|(i, &k)| i == local || k || row[offset + i].is_zero())
    };

    let eqs = rel.equality_matrix();
    let ineqs = rel.inequality_matrix();
    if eqs.rows().chain(ineqs.rows()).all(|row| row[q].is_zero()) {
        return Some(DivisionRepr {
            local,
            dividend: vec![BigInt::zero(); n_cols],
            divisor: BigInt::one(),
        });
    }

    // a*q + e = 0 gives q = -e / a exactly.
    for row in eqs.rows() {
        if row[q].is_zero() || !defined_by_known(row) {
            continue;
        }
        let a = &row[q];
        let mut dividend: Vec<BigInt> = if a.is_positive() {
            row.iter().map(|v| -v).collect()
        } else {
            row.to_vec()
        };
        dividend[q] = BigInt::zero();
        return Some(DivisionRepr {
            local,
            dividend,
            divisor: a.abs(),
        });
    }

    for lower in ineqs.rows() {
        if !lower[q].is_negative() || !defined_by_known(lower) {
            continue;
        }
        let divisor = -&lower[q];
        for upper in ineqs.rows() {
            if !(0..constant).all(|c| (&lower[c] + &upper[c]).is_zero()) {
                continue;
            }
            let slack = &lower[constant] + &upper[constant];
            if !slack.is_negative() && slack < divisor {
                let mut dividend = lower.to_vec();
                dividend[q] = BigInt::zero();
                return Some(DivisionRepr {
                    local,
                    dividend,
                    divisor,
                });
            }
        }
    }
    None
}

/// Whether every integer point of `lhs` is a point of `rhs`. The spaces must
/// be compatible; locals may differ.
pub(crate) fn is_subset<S: IntegerSampler + ?Sized>(
    lhs: &IntegerRelation,
    rhs: &IntegerRelation,
    sampler: &S,
) -> PresburgerResult<bool> {
    if rhs.num_constraints() == 0 {
        return Ok(true);
    }
    let reprs = division_representations(rhs)?;

    let shared = lhs.space().num_dim_and_symbol_vars();
    let lhs_locals = lhs.num_local_vars();
    let mut base = lhs.clone();
    base.append_var(VarKind::Local, rhs.num_local_vars())?;
    let n_cols = base.num_cols();
    let map_row = |row: &[BigInt]| -> Vec<BigInt> {
        let mut mapped = vec![BigInt::zero(); n_cols];
        mapped[..shared].clone_from_slice(&row[..shared]);
        let locals = &row[shared..row.len() - 1];
        mapped[shared + lhs_locals..n_cols - 1].clone_from_slice(locals);
        mapped[n_cols - 1] = row[row.len() - 1].clone();
        mapped
    };

    for repr in &reprs {
        let q = shared + lhs_locals + repr.local;
        let mut lower = map_row(&repr.dividend);
        lower[q] -= &repr.divisor;
        let mut upper: Vec<BigInt> = lower.iter().map(|v| -v).collect();
        upper[n_cols - 1] += &repr.divisor - BigInt::one();
        base.add_inequality(&lower)?;
        base.add_inequality(&upper)?;
    }

    let mut pieces = Vec::with_capacity(rhs.num_inequalities() + 2 * rhs.num_equalities());
    for row in rhs.inequality_matrix().rows() {
        pieces.push(negated(&map_row(row), n_cols));
    }
    for row in rhs.equality_matrix().rows() {
        let mapped = map_row(row);
        let mut above = mapped.clone();
        above[n_cols - 1] -= BigInt::one();
        pieces.push(above);
        pieces.push(negated(&mapped, n_cols));
    }
    debug!(
        "checking {} difference pieces against {} division definitions",
        pieces.len(),
        reprs.len()
    );

    for constraint in &pieces {
        let mut piece = base.clone();
        piece.add_inequality(constraint)?;
        if !sampler.sample(&piece)?.is_empty() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `-row - 1 >= 0`, the integer negation of `row >= 0`.
fn negated(row: &[BigInt], n_cols: usize) -> Vec<BigInt> {
    let mut negated: Vec<BigInt> = row.iter().map(|v| -v).collect();
    negated[n_cols - 1] -= BigInt::one();
    negated
}
