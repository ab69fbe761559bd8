//! Exact integer emptiness checks and sampling.
//!
//! [`OmegaSampler`] decides integer feasibility of a relation with an Omega
//! test:
//!
//! 1. Rows are normalized by the gcd of their variable coefficients. An
//!    equality whose constant is not divisible has no integer solution; an
//!    inequality's constant is floored.
//! 2. Equalities are eliminated one at a time. A variable with a unit
//!    coefficient is substituted away. Otherwise a unimodular change of
//!    variables reduces the other coefficients modulo the smallest one until a
//!    unit coefficient appears.
//! 3. Inequalities are eliminated by Fourier-Motzkin. Elimination is exact when
//!    all lower or all upper bound coefficients are one. Otherwise the dark
//!    shadow is tried first and, if it is empty while the real shadow is not,
//!    the splinters `a*x = lower + i` are searched.
//!
//! A witness is rebuilt on the way back out of the recursion.

use crate::polyhedral::relation::IntegerRelation;
use crate::utils::errors::{PresburgerError, PresburgerResult};
use crate::utils::matrix::{ceil_div, eval_row, floor_div, gcd_range, min_abs_nonzero, IntMatrix};
use log::{debug, trace};
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

/// Result of an integer sampling query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A point satisfying every constraint, one value per variable
    Point(Vec<BigInt>),
    /// The relation has no integer point
    Empty,
}

impl SampleOutcome {
    /// Check if no point was found.
    pub fn is_empty(&self) -> bool {
        matches!(self, SampleOutcome::Empty)
    }

    /// Get the witness point, if any.
    pub fn point(&self) -> Option<&[BigInt]> {
        match self {
            SampleOutcome::Point(p) => Some(p),
            SampleOutcome::Empty => None,
        }
    }
}

/// An exact integer emptiness/sampling procedure.
///
/// Implementations must be exact over the integers: a relation whose rational
/// relaxation is feasible but which has no integer point is `Empty`. Verdicts
/// must be deterministic; witness points need not be.
pub trait IntegerSampler {
    /// Find an integer point of `relation` or prove there is none.
    fn sample(&self, relation: &IntegerRelation) -> PresburgerResult<SampleOutcome>;
}

/// Configuration for [`OmegaSampler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Maximum number of recursive search steps. `None` means unbounded.
    pub max_steps: Option<u64>,
}

impl SamplerConfig {
    /// Limit the search to `steps` recursive steps.
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }
}

/// The default sampler: an Omega test over arbitrary-precision integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OmegaSampler {
    config: SamplerConfig,
}

impl OmegaSampler {
    /// Create a sampler with the given configuration.
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }
}

impl IntegerSampler for OmegaSampler {
    fn sample(&self, relation: &IntegerRelation) -> PresburgerResult<SampleOutcome> {
        let system = System {
            eqs: relation.equality_matrix().clone(),
            ineqs: relation.inequality_matrix().clone(),
        };
        let mut search = Search {
            steps: 0,
            max_steps: self.config.max_steps,
        };
        let outcome = match search.solve(system)? {
            Some(point) => {
                debug_assert!(relation.contains_point(&point).unwrap_or(false));
                SampleOutcome::Point(point)
            }
            None => SampleOutcome::Empty,
        };
        debug!(
            "sampled relation with {} constraints in {} steps: {}",
            relation.num_constraints(),
            search.steps,
            if outcome.is_empty() { "empty" } else { "non-empty" }
        );
        Ok(outcome)
    }
}

/// A constraint system over anonymous variables; the last column is the
/// constant term.
#[derive(Debug, Clone)]
struct System {
    eqs: IntMatrix,
    ineqs: IntMatrix,
}

/// The rows bounding one variable from below (positive coefficient) and from
/// above (negative coefficient).
#[derive(Debug)]
struct VarBounds {
    var: usize,
    lowers: Vec<usize>,
    uppers: Vec<usize>,
}

impl VarBounds {
    fn is_unbounded(&self) -> bool {
        self.lowers.is_empty() || self.uppers.is_empty()
    }

    fn n_pairs(&self) -> usize {
        self.lowers.len() * self.uppers.len()
    }
}

impl System {
    fn n_vars(&self) -> usize {
        self.ineqs.n_cols() - 1
    }

    fn empty(n_cols: usize, n_ineqs: usize) -> Self {
        Self {
            eqs: IntMatrix::with_reserved(n_cols, 0, n_cols),
            ineqs: IntMatrix::with_reserved(n_cols, n_ineqs, n_cols),
        }
    }

    /// Divide rows by their gcd, drop constant rows and turn opposite
    /// inequality pairs into equalities. Returns false if a row alone proves
    /// the system infeasible.
    fn normalize(&mut self) -> PresburgerResult<bool> {
        let n = self.n_vars();

        let mut r = 0;
        while r < self.eqs.n_rows() {
            let row = self.eqs.row_mut(r);
            let g = gcd_range(&row[..n]);
            if g.is_zero() {
                if !row[n].is_zero() {
                    return Ok(false);
                }
                self.eqs.remove_row(r)?;
                continue;
            }
            if !(&row[n] % &g).is_zero() {
                return Ok(false);
            }
            if !g.is_one() {
                for v in row.iter_mut() {
                    *v = &*v / &g;
                }
            }
            r += 1;
        }

        let mut r = 0;
        while r < self.ineqs.n_rows() {
            let row = self.ineqs.row_mut(r);
            let g = gcd_range(&row[..n]);
            if g.is_zero() {
                if row[n].is_negative() {
                    return Ok(false);
                }
                self.ineqs.remove_row(r)?;
                continue;
            }
            if !g.is_one() {
                for v in row[..n].iter_mut() {
                    *v = &*v / &g;
                }
                row[n] = floor_div(&row[n], &g);
            }
            r += 1;
        }

        self.merge_opposite_inequalities()
    }

    fn merge_opposite_inequalities(&mut self) -> PresburgerResult<bool> {
        let n = self.n_vars();
        let mut i = 0;
        while i < self.ineqs.n_rows() {
            let mut partner = None;
            let ri = self.ineqs.row(i)?;
            for j in (i + 1)..self.ineqs.n_rows() {
                let rj = self.ineqs.row(j)?;
                if !ri[..n].iter().zip(&rj[..n]).all(|(a, b)| (a + b).is_zero()) {
                    continue;
                }
                let slack = &ri[n] + &rj[n];
                if slack.is_negative() {
                    return Ok(false);
                }
                if slack.is_zero() {
                    partner = Some(j);
                    break;
                }
            }
            match partner {
                Some(j) => {
                    let row = ri.to_vec();
                    self.eqs.add_row(&row)?;
                    self.ineqs.remove_row(j)?;
                    self.ineqs.remove_row(i)?;
                }
                None => i += 1,
            }
        }
        Ok(true)
    }

    /// Substitute variable `k` using `row`, an equality whose coefficient at
    /// `k` is `pivot` (either 1 or -1), then drop column `k`.
    fn substitute(&mut self, k: usize, row: &[BigInt], pivot: &BigInt) -> PresburgerResult<()> {
        for mat in [&mut self.eqs, &mut self.ineqs] {
            for r in 0..mat.n_rows() {
                let target = mat.row_mut(r);
                if target[k].is_zero() {
                    continue;
                }
                let scale = -(&target[k] * pivot);
                for (t, v) in target.iter_mut().zip(row) {
                    *t += &scale * v;
                }
            }
            mat.remove_columns(k, 1)?;
        }
        Ok(())
    }

    /// Pick the next variable to eliminate: an unbounded one if possible,
    /// then one with exact elimination, then the fewest bound pairs.
    fn choose_variable(&self) -> Option<VarBounds> {
        let mut best: Option<(VarBounds, (bool, usize))> = None;
        for var in 0..self.n_vars() {
            let mut bounds = VarBounds {
                var,
                lowers: Vec::new(),
                uppers: Vec::new(),
            };
            for (r, row) in self.ineqs.rows().enumerate() {
                if row[var].is_positive() {
                    bounds.lowers.push(r);
                } else if row[var].is_negative() {
                    bounds.uppers.push(r);
                }
            }
            if bounds.lowers.is_empty() && bounds.uppers.is_empty() {
                continue;
            }
            if bounds.is_unbounded() {
                return Some(bounds);
            }
            let cost = (!self.is_exact(&bounds), bounds.n_pairs());
            if best.as_ref().map_or(true, |(_, c)| cost < *c) {
                best = Some((bounds, cost));
            }
        }
        best.map(|(bounds, _)| bounds)
    }

    /// Fourier-Motzkin is exact over the integers when every lower bound or
    /// every upper bound has a unit coefficient.
    fn is_exact(&self, bounds: &VarBounds) -> bool {
        let unit = |rows: &[usize]| {
            rows.iter()
                .all(|&r| self.ineqs.row(r).map_or(false, |row| row[bounds.var].abs().is_one()))
        };
        unit(&bounds.lowers) || unit(&bounds.uppers)
    }

    /// Drop every row mentioning `var` and the column of `var`.
    fn drop_var(&self, var: usize) -> PresburgerResult<System> {
        let mut projected = System::empty(self.ineqs.n_cols(), self.ineqs.n_rows());
        for row in self.ineqs.rows().filter(|row| row[var].is_zero()) {
            projected.ineqs.add_row(row)?;
        }
        projected.ineqs.remove_columns(var, 1)?;
        projected.eqs.remove_columns(var, 1)?;
        Ok(projected)
    }

    /// The real shadow (or, with `dark`, the dark shadow) of eliminating
    /// `bounds.var`.
    fn shadow(&self, bounds: &VarBounds, dark: bool) -> PresburgerResult<System> {
        let var = bounds.var;
        let n = self.n_vars();
        let mut projected = System::empty(n + 1, self.ineqs.n_rows() + bounds.n_pairs());
        for row in self.ineqs.rows().filter(|row| row[var].is_zero()) {
            projected.ineqs.add_row(row)?;
        }
        for &l in &bounds.lowers {
            let lower = self.ineqs.row(l)?;
            let a = &lower[var];
            for &u in &bounds.uppers {
                let upper = self.ineqs.row(u)?;
                let b = -&upper[var];
                let mut combined: Vec<BigInt> = lower.iter().zip(upper).map(|(x, y)| &b * x + a * y).collect();
                if dark {
                    combined[n] -= (a - BigInt::one()) * (&b - BigInt::one());
                }
                projected.ineqs.add_row(&combined)?;
            }
        }
        projected.ineqs.remove_columns(var, 1)?;
        projected.eqs.remove_columns(var, 1)?;
        Ok(projected)
    }

    /// Given values for every other variable (with `point[var]` zero), choose
    /// a value for `var` within its bounds: the greatest lower bound, else the
    /// least upper bound, else zero.
    fn pick_value(&self, var: usize, point: &[BigInt]) -> BigInt {
        let mut lower: Option<BigInt> = None;
        let mut upper: Option<BigInt> = None;
        for row in self.ineqs.rows() {
            let coeff = &row[var];
            if coeff.is_zero() {
                continue;
            }
            let rest = eval_row(row, point);
            if coeff.is_positive() {
                let bound = ceil_div(&-rest, coeff);
                lower = Some(match lower {
                    Some(l) if l >= bound => l,
                    _ => bound,
                });
            } else {
                let bound = floor_div(&rest, &-coeff);
                upper = Some(match upper {
                    Some(u) if u <= bound => u,
                    _ => bound,
                });
            }
        }
        lower.or(upper).unwrap_or_default()
    }
}

struct Search {
    steps: u64,
    max_steps: Option<u64>,
}

impl Search {
    fn tick(&mut self) -> PresburgerResult<()> {
        self.steps += 1;
        match self.max_steps {
            Some(max) if self.steps > max => Err(PresburgerError::BudgetExhausted { steps: max }),
            _ => Ok(()),
        }
    }

    fn solve(&mut self, mut sys: System) -> PresburgerResult<Option<Vec<BigInt>>> {
        self.tick()?;
        if !sys.normalize()? {
            return Ok(None);
        }
        if sys.eqs.n_rows() > 0 {
            return self.solve_equality(sys);
        }
        if sys.ineqs.n_rows() == 0 {
            return Ok(Some(vec![BigInt::zero(); sys.n_vars()]));
        }
        self.solve_inequalities(sys)
    }

    fn solve_equality(&mut self, mut sys: System) -> PresburgerResult<Option<Vec<BigInt>>> {
        let n = sys.n_vars();
        let row = sys.eqs.row(0)?.to_vec();
        let k = match min_abs_nonzero(&row[..n]) {
            Some(k) => k,
            None => {
                sys.eqs.remove_row(0)?;
                return self.solve(sys);
            }
        };
        let pivot = row[k].clone();

        if pivot.abs().is_one() {
            trace!("substituting variable {} of {}", k, n);
            sys.eqs.remove_row(0)?;
            sys.substitute(k, &row, &pivot)?;
            let mut point = match self.solve(sys)? {
                Some(point) => point,
                None => return Ok(None),
            };
            point.insert(k, BigInt::zero());
            point[k] = -&pivot * eval_row(&row, &point);
            return Ok(Some(point));
        }

        // x_k = y_k - sum(q_j * y_j) keeps the lattice and leaves a_j mod a_k
        // in column j.
        trace!("reducing equality coefficients modulo {}", pivot);
        let quotients: Vec<BigInt> = row[..n]
            .iter()
            .enumerate()
            .map(|(j, a)| {
                if j == k || a.is_zero() {
                    BigInt::zero()
                } else {
                    floor_div(a, &pivot)
                }
            })
            .collect();
        for (j, q) in quotients.iter().enumerate().filter(|(_, q)| !q.is_zero()) {
            let scale = -q;
            sys.eqs.add_to_column(k, j, &scale)?;
            sys.ineqs.add_to_column(k, j, &scale)?;
        }
        let mut point = match self.solve(sys)? {
            Some(point) => point,
            None => return Ok(None),
        };
        let shift: BigInt = quotients.iter().zip(&point).map(|(q, y)| q * y).sum();
        point[k] -= shift;
        Ok(Some(point))
    }

    fn solve_inequalities(&mut self, sys: System) -> PresburgerResult<Option<Vec<BigInt>>> {
        let bounds = match sys.choose_variable() {
            Some(bounds) => bounds,
            None => return Ok(Some(vec![BigInt::zero(); sys.n_vars()])),
        };
        let var = bounds.var;

        if bounds.is_unbounded() {
            trace!("dropping unbounded variable {}", var);
            let projected = sys.drop_var(var)?;
            return self.lift(projected, &sys, var);
        }

        if sys.is_exact(&bounds) {
            trace!("exact elimination of variable {} ({} pairs)", var, bounds.n_pairs());
            let real = sys.shadow(&bounds, false)?;
            return self.lift(real, &sys, var);
        }

        trace!("inexact elimination of variable {} ({} pairs)", var, bounds.n_pairs());
        let dark = sys.shadow(&bounds, true)?;
        if let Some(point) = self.lift(dark, &sys, var)? {
            return Ok(Some(point));
        }
        let real = sys.shadow(&bounds, false)?;
        if self.solve(real)?.is_none() {
            return Ok(None);
        }
        self.search_splinters(&sys, &bounds)
    }

    /// Solve the projected system and extend its point with a value for the
    /// eliminated variable.
    fn lift(&mut self, projected: System, sys: &System, var: usize) -> PresburgerResult<Option<Vec<BigInt>>> {
        let mut point = match self.solve(projected)? {
            Some(point) => point,
            None => return Ok(None),
        };
        point.insert(var, BigInt::zero());
        point[var] = sys.pick_value(var, &point);
        Ok(Some(point))
    }

    /// Any integer point outside the dark shadow lies on one of the planes
    /// `a*x = lower + i` with `0 <= i <= (a*m - a - m) / m`, where `m` is the
    /// largest upper bound coefficient.
    fn search_splinters(&mut self, sys: &System, bounds: &VarBounds) -> PresburgerResult<Option<Vec<BigInt>>> {
        let var = bounds.var;
        let n = sys.n_vars();
        let mut m = BigInt::zero();
        for &u in &bounds.uppers {
            let b = -&sys.ineqs.row(u)?[var];
            if b > m {
                m = b;
            }
        }

        for &l in &bounds.lowers {
            let lower = sys.ineqs.row(l)?.to_vec();
            let a = &lower[var];
            let limit = floor_div(&(a * &m - a - &m), &m);
            let mut i = BigInt::zero();
            while i <= limit {
                trace!("splinter {} of lower bound {} on variable {}", i, l, var);
                let mut plane = lower.clone();
                plane[n] -= &i;
                let mut splinter = sys.clone();
                splinter.eqs.add_row(&plane)?;
                if let Some(point) = self.solve(splinter)? {
                    return Ok(Some(point));
                }
                i += BigInt::one();
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::space::PresburgerSpace;

    fn relation(ineqs: &[Vec<i64>], eqs: &[Vec<i64>], n_vars: usize) -> IntegerRelation {
        let mut rel = IntegerRelation::universe(PresburgerSpace::set(n_vars));
        for row in ineqs {
            rel.add_inequality(row).unwrap();
        }
        for row in eqs {
            rel.add_equality(row).unwrap();
        }
        rel
    }

    fn sample(rel: &IntegerRelation) -> SampleOutcome {
        let outcome = OmegaSampler::default().sample(rel).unwrap();
        if let Some(point) = outcome.point() {
            assert!(rel.contains_point(point).unwrap(), "witness {:?} violates {}", point, rel);
        }
        outcome
    }

    #[test]
    fn test_universe_is_nonempty() {
        let rel = relation(&[], &[], 3);
        assert_eq!(sample(&rel).point().map(|p| p.len()), Some(3));
    }

    #[test]
    fn test_constant_contradiction() {
        assert!(sample(&relation(&[vec![0, -1]], &[], 1)).is_empty());
        assert!(sample(&relation(&[], &[vec![0, 3]], 1)).is_empty());
    }

    #[test]
    fn test_box() {
        // 2 <= x <= 5, -3 <= y <= -1
        let rel = relation(
            &[vec![1, 0, -2], vec![-1, 0, 5], vec![0, 1, 3], vec![0, -1, -1]],
            &[],
            2,
        );
        assert!(!sample(&rel).is_empty());
    }

    #[test]
    fn test_equality_without_integer_solution() {
        // 2x = 1
        assert!(sample(&relation(&[], &[vec![2, -1]], 1)).is_empty());
        // 4x + 6y = 3
        assert!(sample(&relation(&[], &[vec![4, 6, -3]], 2)).is_empty());
    }

    #[test]
    fn test_equality_requires_column_reduction() {
        // 3x + 5y = 1, 0 <= x <= 10
        let rel = relation(&[vec![1, 0, 0], vec![-1, 0, 10]], &[vec![3, 5, -1]], 2);
        assert!(!sample(&rel).is_empty());
        // 6x + 10y + 15z = 7 with 0 <= x, y, z <= 1 has no solution.
        let rel = relation(
            &[
                vec![1, 0, 0, 0],
                vec![-1, 0, 0, 1],
                vec![0, 1, 0, 0],
                vec![0, -1, 0, 1],
                vec![0, 0, 1, 0],
                vec![0, 0, -1, 1],
            ],
            &[vec![6, 10, 15, -7]],
            3,
        );
        assert!(sample(&rel).is_empty());
    }

    #[test]
    fn test_rational_but_not_integer() {
        // 1 <= 3x <= 2
        assert!(sample(&relation(&[vec![3, -1], vec![-3, 2]], &[], 1)).is_empty());
        // 27 <= 11x + 13y <= 45, -10 <= 7x - 9y <= 4
        let rel = relation(
            &[
                vec![11, 13, -27],
                vec![-11, -13, 45],
                vec![7, -9, 10],
                vec![-7, 9, 4],
            ],
            &[],
            2,
        );
        assert!(sample(&rel).is_empty());
    }

    #[test]
    fn test_inexact_elimination_with_solution() {
        // 2 <= 3x - 2y <= 4, 1 <= x + y <= 10, y >= 1
        let rel = relation(
            &[
                vec![3, -2, -2],
                vec![-3, 2, 4],
                vec![1, 1, -1],
                vec![-1, -1, 10],
                vec![0, 1, -1],
            ],
            &[],
            2,
        );
        assert!(!sample(&rel).is_empty());
    }

    #[test]
    fn test_splinter_needed() {
        // Neither bound pair has unit coefficients, so both shadows and
        // possibly the splinters are exercised. The region is bounded.
        let rel = relation(
            &[
                vec![5, -3, 0],
                vec![-5, 3, 1],
                vec![-3, 5, -2],
                vec![3, -5, 3],
            ],
            &[],
            2,
        );
        let outcome = sample(&rel);
        let brute = (-50i64..=50).any(|x| {
            (-50i64..=50).any(|y| {
                let p = 5 * x - 3 * y;
                let q = 5 * y - 3 * x;
                (0..=1).contains(&p) && (2..=3).contains(&q)
            })
        });
        assert_eq!(!outcome.is_empty(), brute);
    }

    #[test]
    fn test_budget_exhaustion_is_an_error() {
        let rel = relation(&[vec![11, 13, -27], vec![-11, -13, 45], vec![7, -9, 10]], &[], 2);
        let sampler = OmegaSampler::new(SamplerConfig::default().with_max_steps(1));
        match sampler.sample(&rel) {
            Err(PresburgerError::BudgetExhausted { steps }) => assert_eq!(steps, 1),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_deterministic_verdict() {
        let rel = relation(&[vec![2, 3, -7], vec![-2, -3, 9]], &[vec![1, -1, 0]], 2);
        let first = sample(&rel).is_empty();
        for _ in 0..5 {
            assert_eq!(sample(&rel).is_empty(), first);
        }
    }
}
