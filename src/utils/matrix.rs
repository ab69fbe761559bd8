//! Dense integer matrices for constraint tableaux.
//!
//! Rows are stored row-major with a stride of `n_reserved_cols`, so columns
//! can be inserted or removed without reallocating as long as the reserved
//! width allows it. Row capacity is tracked by the backing vector and is never
//! confused with the live row count.

use crate::utils::errors::{IndexError, IndexErrorKind, PresburgerResult, ShapeError};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use std::fmt;

/// A dense matrix of arbitrary-precision integers.
///
/// Padding columns between `n_cols` and `n_reserved_cols` are always zero.
#[derive(Debug, Clone)]
pub struct IntMatrix {
    data: Vec<BigInt>,
    n_rows: usize,
    n_cols: usize,
    n_reserved_cols: usize,
}

impl IntMatrix {
    /// Create a matrix with `n_cols` columns and no rows, reserving space for
    /// `reserved_rows` rows of `reserved_cols` columns.
    pub fn with_reserved(n_cols: usize, reserved_rows: usize, reserved_cols: usize) -> Self {
        let stride = n_cols.max(reserved_cols);
        Self {
            data: Vec::with_capacity(reserved_rows * stride),
            n_rows: 0,
            n_cols,
            n_reserved_cols: stride,
        }
    }

    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![BigInt::zero(); rows * cols],
            n_rows: rows,
            n_cols: cols,
            n_reserved_cols: cols,
        }
    }

    /// Create a matrix from rows, checking that every row has `n_cols` entries.
    pub fn from_rows<T, R>(n_cols: usize, rows: &[R]) -> PresburgerResult<Self>
    where
        T: Clone + Into<BigInt>,
        R: AsRef<[T]>,
    {
        if let Some(bad) = rows.iter().find(|r| r.as_ref().len() != n_cols) {
            return Err(ShapeError::row_length(n_cols, bad.as_ref().len()).into());
        }
        let mut mat = Self::with_reserved(n_cols, rows.len(), n_cols);
        for row in rows {
            mat.add_row(row.as_ref())?;
        }
        Ok(mat)
    }

    /// Get the number of live rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Get the number of live columns.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Get the number of rows that fit without reallocating.
    pub fn n_reserved_rows(&self) -> usize {
        if self.n_reserved_cols == 0 {
            self.n_rows
        } else {
            self.data.capacity() / self.n_reserved_cols
        }
    }

    /// Get the row stride, i.e. the number of columns that fit without
    /// relayout.
    pub fn n_reserved_cols(&self) -> usize {
        self.n_reserved_cols
    }

    /// Make sure at least `rows` rows fit without reallocating.
    pub fn reserve_rows(&mut self, rows: usize) {
        let needed = rows * self.n_reserved_cols;
        if needed > self.data.len() {
            self.data.reserve(needed - self.data.len());
        }
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.n_reserved_cols + col
    }

    fn check_row(&self, row: usize) -> PresburgerResult<()> {
        Ok(IndexError::check(IndexErrorKind::Row, row, self.n_rows)?)
    }

    fn check_cell(&self, row: usize, col: usize) -> PresburgerResult<()> {
        self.check_row(row)?;
        Ok(IndexError::check(IndexErrorKind::Column, col, self.n_cols)?)
    }

    /// Get an element.
    pub fn at(&self, row: usize, col: usize) -> PresburgerResult<&BigInt> {
        self.check_cell(row, col)?;
        Ok(&self.data[self.offset(row, col)])
    }

    /// Set an element.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<BigInt>) -> PresburgerResult<()> {
        self.check_cell(row, col)?;
        let idx = self.offset(row, col);
        self.data[idx] = value.into();
        Ok(())
    }

    /// Get a row as a slice of its live columns.
    pub fn row(&self, row: usize) -> PresburgerResult<&[BigInt]> {
        self.check_row(row)?;
        Ok(self.row_slice(row))
    }

    fn row_slice(&self, row: usize) -> &[BigInt] {
        let start = self.offset(row, 0);
        &self.data[start..start + self.n_cols]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [BigInt] {
        let start = self.offset(row, 0);
        let end = start + self.n_cols;
        &mut self.data[start..end]
    }

    /// Iterate over the live rows.
    pub fn rows(&self) -> impl Iterator<Item = &[BigInt]> + '_ {
        (0..self.n_rows).map(move |r| self.row_slice(r))
    }

    /// Append a row and return its index.
    pub fn add_row<T: Clone + Into<BigInt>>(&mut self, coefficients: &[T]) -> PresburgerResult<usize> {
        if coefficients.len() != self.n_cols {
            return Err(ShapeError::row_length(self.n_cols, coefficients.len()).into());
        }
        self.data.extend(coefficients.iter().cloned().map(Into::into));
        self.pad_row();
        self.n_rows += 1;
        Ok(self.n_rows - 1)
    }

    /// Append a row of zeros and return its index.
    pub fn add_zero_row(&mut self) -> usize {
        self.data
            .extend(std::iter::repeat(BigInt::zero()).take(self.n_cols));
        self.pad_row();
        self.n_rows += 1;
        self.n_rows - 1
    }

    fn pad_row(&mut self) {
        let padding = self.n_reserved_cols - self.n_cols;
        self.data.extend(std::iter::repeat(BigInt::zero()).take(padding));
    }

    /// Remove a row, shifting the following rows up.
    pub fn remove_row(&mut self, row: usize) -> PresburgerResult<()> {
        self.check_row(row)?;
        let start = self.offset(row, 0);
        self.data.drain(start..start + self.n_reserved_cols);
        self.n_rows -= 1;
        Ok(())
    }

    /// Remove all rows, keeping the reserved capacity.
    pub fn clear_rows(&mut self) {
        self.data.clear();
        self.n_rows = 0;
    }

    /// Insert `count` zero columns before column `pos`.
    pub fn insert_columns(&mut self, pos: usize, count: usize) -> PresburgerResult<()> {
        IndexError::check(IndexErrorKind::Column, pos, self.n_cols + 1)?;
        if count == 0 {
            return Ok(());
        }
        let new_cols = self.n_cols + count;
        if new_cols > self.n_reserved_cols {
            let mut data = Vec::with_capacity(self.n_reserved_rows().max(self.n_rows) * new_cols);
            for r in 0..self.n_rows {
                let row = self.row_slice(r);
                data.extend_from_slice(&row[..pos]);
                data.extend(std::iter::repeat(BigInt::zero()).take(count));
                data.extend_from_slice(&row[pos..]);
            }
            self.data = data;
            self.n_reserved_cols = new_cols;
        } else {
            for r in 0..self.n_rows {
                let start = self.offset(r, 0);
                // The trailing padding is zero, so rotating it into place
                // yields the new zero columns.
                self.data[start + pos..start + new_cols].rotate_right(count);
            }
        }
        self.n_cols = new_cols;
        Ok(())
    }

    /// Remove the columns `pos..pos + count`, shifting later columns left.
    pub fn remove_columns(&mut self, pos: usize, count: usize) -> PresburgerResult<()> {
        IndexError::check(IndexErrorKind::Column, pos + count, self.n_cols + 1)?;
        if count == 0 {
            return Ok(());
        }
        for r in 0..self.n_rows {
            let start = self.offset(r, 0);
            let row = &mut self.data[start + pos..start + self.n_cols];
            row[..count].iter_mut().for_each(|v| v.set_zero());
            row.rotate_left(count);
        }
        self.n_cols -= count;
        Ok(())
    }

    /// Swap two rows.
    pub fn swap_rows(&mut self, a: usize, b: usize) -> PresburgerResult<()> {
        self.check_row(a)?;
        self.check_row(b)?;
        if a != b {
            for c in 0..self.n_cols {
                let (ia, ib) = (self.offset(a, c), self.offset(b, c));
                self.data.swap(ia, ib);
            }
        }
        Ok(())
    }

    /// Negate every entry of a row.
    pub fn negate_row(&mut self, row: usize) -> PresburgerResult<()> {
        self.check_row(row)?;
        for v in self.row_mut(row) {
            *v = -std::mem::take(v);
        }
        Ok(())
    }

    /// `dst_row += scale * src_row`
    pub fn add_to_row(&mut self, src: usize, dst: usize, scale: &BigInt) -> PresburgerResult<()> {
        self.check_row(src)?;
        self.check_row(dst)?;
        if scale.is_zero() {
            return Ok(());
        }
        for c in 0..self.n_cols {
            let v = &self.data[self.offset(src, c)] * scale;
            let idx = self.offset(dst, c);
            self.data[idx] += v;
        }
        Ok(())
    }

    /// `dst_col += scale * src_col` in every row.
    pub fn add_to_column(&mut self, src: usize, dst: usize, scale: &BigInt) -> PresburgerResult<()> {
        IndexError::check(IndexErrorKind::Column, src, self.n_cols)?;
        IndexError::check(IndexErrorKind::Column, dst, self.n_cols)?;
        if scale.is_zero() {
            return Ok(());
        }
        for r in 0..self.n_rows {
            let v = &self.data[self.offset(r, src)] * scale;
            let idx = self.offset(r, dst);
            self.data[idx] += v;
        }
        Ok(())
    }

    /// Divide the first `n` entries of a row by their gcd and return the gcd.
    /// A zero gcd leaves the row untouched.
    pub fn normalize_row(&mut self, row: usize, n: usize) -> PresburgerResult<BigInt> {
        self.check_row(row)?;
        IndexError::check(IndexErrorKind::Column, n, self.n_cols + 1)?;
        let values = &mut self.row_mut(row)[..n];
        let g = gcd_range(values);
        if !g.is_zero() && g != BigInt::from(1) {
            for v in values.iter_mut() {
                *v = &*v / &g;
            }
        }
        Ok(g)
    }
}

impl PartialEq for IntMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.n_rows == other.n_rows
            && self.n_cols == other.n_cols
            && self.rows().zip(other.rows()).all(|(a, b)| a == b)
    }
}

impl Eq for IntMatrix {}

impl fmt::Display for IntMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            write!(f, "[")?;
            for (j, val) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", val)?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

/// Compute the non-negative GCD of a slice of integers (zero for an all-zero
/// slice).
pub fn gcd_range(values: &[BigInt]) -> BigInt {
    values.iter().fold(BigInt::zero(), |acc, x| acc.gcd(x))
}

/// Integer floor division (rounds toward negative infinity).
pub fn floor_div(a: &BigInt, b: &BigInt) -> BigInt {
    a.div_floor(b)
}

/// Integer ceiling division (rounds toward positive infinity).
pub fn ceil_div(a: &BigInt, b: &BigInt) -> BigInt {
    -((-a).div_floor(b))
}

/// Evaluate `row · (point, 1)`: the last entry of `row` is the constant term.
pub fn eval_row(row: &[BigInt], point: &[BigInt]) -> BigInt {
    let (constant, coeffs) = match row.split_last() {
        Some(split) => split,
        None => return BigInt::zero(),
    };
    coeffs
        .iter()
        .zip(point)
        .filter(|(c, _)| !c.is_zero())
        .fold(constant.clone(), |acc, (c, x)| acc + c * x)
}

/// Whether every coefficient in the slice is zero.
pub fn is_zero_range(values: &[BigInt]) -> bool {
    values.iter().all(Zero::is_zero)
}

/// Index of the entry with the smallest nonzero magnitude, if any.
pub fn min_abs_nonzero(values: &[BigInt]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_zero())
        .min_by(|(_, a), (_, b)| a.abs().cmp(&b.abs()))
        .map(|(i, _)| i)
}
