//! Host coefficient buffers.
//!
//! A host environment (scripting layer, C ABI, CLI) hands the relation two
//! dense 2D buffers of coefficients. This module describes such a buffer
//! without depending on any host runtime and validates the whole layout
//! before a single row is read.

use crate::utils::errors::{BufferError, BufferErrorKind, PresburgerResult};
use std::borrow::Cow;

const I64_SIZE: usize = std::mem::size_of::<i64>();

/// A 2D buffer as described by the host: raw bytes plus a struct-style
/// format code, item size, shape and byte strides.
#[derive(Debug, Clone)]
pub struct CoefficientBuffer<'a> {
    /// Raw element bytes, in the byte order named by `format`
    pub bytes: Cow<'a, [u8]>,
    /// Element format code, e.g. `"q"` or `"<l"`
    pub format: Cow<'a, str>,
    /// Size of one element in bytes
    pub item_size: usize,
    /// Extent of each dimension
    pub shape: Vec<usize>,
    /// Byte step of each dimension
    pub strides: Vec<isize>,
}

/// The validated contents of a [`CoefficientBuffer`], row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientRows {
    /// Number of rows
    pub n_rows: usize,
    /// Number of columns
    pub n_cols: usize,
    /// `n_rows * n_cols` values
    pub values: Vec<i64>,
}

impl CoefficientRows {
    /// Iterate over the rows.
    pub fn rows(&self) -> impl Iterator<Item = &[i64]> + '_ {
        (0..self.n_rows).map(move |r| &self.values[r * self.n_cols..(r + 1) * self.n_cols])
    }
}

impl<'a> CoefficientBuffer<'a> {
    /// Build a row-major `i64` buffer from `n_cols`-wide rows. Rows that are
    /// not `n_cols` wide produce a buffer whose length disagrees with its
    /// shape, which validation rejects.
    pub fn from_rows_i64<R: AsRef<[i64]>>(rows: &[R], n_cols: usize) -> CoefficientBuffer<'static> {
        let bytes: Vec<u8> = rows
            .iter()
            .flat_map(|row| row.as_ref().iter().flat_map(|v| v.to_ne_bytes()))
            .collect();
        CoefficientBuffer {
            bytes: Cow::Owned(bytes),
            format: Cow::Borrowed("q"),
            item_size: I64_SIZE,
            shape: vec![rows.len(), n_cols],
            strides: vec![(n_cols * I64_SIZE) as isize, I64_SIZE as isize],
        }
    }

    /// Check rank, element format, contiguity and length, then decode.
    pub fn validate(&self) -> PresburgerResult<CoefficientRows> {
        if self.shape.len() != 2 || self.strides.len() != 2 {
            return Err(buffer_error(
                BufferErrorKind::Rank,
                format!("expected 2d coefficients but got rank {}", self.shape.len()),
            ));
        }
        let order = match element_byte_order(&self.format) {
            Some(order) if self.item_size == I64_SIZE => order,
            _ => {
                return Err(buffer_error(
                    BufferErrorKind::Format,
                    format!(
                        "relations can only be created from i64 buffers but got format '{}' with item size {}",
                        self.format, self.item_size
                    ),
                ))
            }
        };
        let (n_rows, n_cols) = (self.shape[0], self.shape[1]);
        let sizes = n_cols
            .checked_mul(I64_SIZE)
            .and_then(|row_bytes| Some((row_bytes, n_rows.checked_mul(row_bytes)?)));
        let (row_bytes, expected) = match sizes {
            Some(sizes) => sizes,
            None => {
                return Err(buffer_error(
                    BufferErrorKind::Length,
                    format!("shape {:?} overflows the addressable byte length", self.shape),
                ))
            }
        };
        if !self.is_row_major_contiguous(row_bytes) {
            return Err(buffer_error(
                BufferErrorKind::NotContiguous,
                format!("row-major contiguous buffer required, got strides {:?}", self.strides),
            ));
        }
        if self.bytes.len() != expected {
            return Err(buffer_error(
                BufferErrorKind::Length,
                format!("shape {:?} needs {} bytes, buffer has {}", self.shape, expected, self.bytes.len()),
            ));
        }

        let values = self
            .bytes
            .chunks_exact(I64_SIZE)
            .map(|chunk| {
                let mut word = [0u8; I64_SIZE];
                word.copy_from_slice(chunk);
                order.decode(word)
            })
            .collect();
        Ok(CoefficientRows { n_rows, n_cols, values })
    }

    /// Strides of extent-1 dimensions are irrelevant, as in the buffer
    /// protocol's own contiguity check.
    fn is_row_major_contiguous(&self, row_bytes: usize) -> bool {
        let (n_rows, n_cols) = (self.shape[0], self.shape[1]);
        let col_ok = n_cols <= 1 || self.strides[1] == I64_SIZE as isize;
        let row_ok = n_rows <= 1 || isize::try_from(row_bytes).map_or(false, |step| self.strides[0] == step);
        col_ok && row_ok
    }
}

/// Byte order of the buffer elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Native,
    Little,
    Big,
}

impl ByteOrder {
    fn decode(self, word: [u8; I64_SIZE]) -> i64 {
        match self {
            ByteOrder::Native => i64::from_ne_bytes(word),
            ByteOrder::Little => i64::from_le_bytes(word),
            ByteOrder::Big => i64::from_be_bytes(word),
        }
    }
}

/// Parses a signed integer format code with at most one byte-order prefix.
///
/// Without a prefix or with `@`, sizes are native and any of `b h i l q` may
/// name the 8-byte item. The standard-size prefixes `= < > !` leave `q` as the
/// only 8-byte signed code.
fn element_byte_order(format: &str) -> Option<ByteOrder> {
    let mut chars = format.chars();
    let (order, code) = match chars.next()? {
        '@' | '=' => (ByteOrder::Native, chars.as_str()),
        '<' => (ByteOrder::Little, chars.as_str()),
        '>' | '!' => (ByteOrder::Big, chars.as_str()),
        _ => return matches!(format, "b" | "h" | "i" | "l" | "q").then_some(ByteOrder::Native),
    };
    let native_size = format.starts_with('@');
    let accepted = if native_size {
        matches!(code, "b" | "h" | "i" | "l" | "q")
    } else {
        code == "q"
    };
    accepted.then_some(order)
}

fn buffer_error(kind: BufferErrorKind, message: String) -> crate::utils::errors::PresburgerError {
    BufferError { message, kind }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::PresburgerError;

    fn kind_of(err: PresburgerError) -> BufferErrorKind {
        match err {
            PresburgerError::Buffer(e) => e.kind,
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_roundtrip_rows() {
        let buf = CoefficientBuffer::from_rows_i64(&[vec![1, -2, 3], vec![4, 5, i64::MIN]], 3);
        let rows = buf.validate().unwrap();
        assert_eq!(rows.n_rows, 2);
        assert_eq!(rows.n_cols, 3);
        let collected: Vec<&[i64]> = rows.rows().collect();
        assert_eq!(collected[1], &[4, 5, i64::MIN]);
    }

    #[test]
    fn test_empty_buffer() {
        let buf = CoefficientBuffer::from_rows_i64::<Vec<i64>>(&[], 3);
        let rows = buf.validate().unwrap();
        assert_eq!(rows.n_rows, 0);
        assert_eq!(rows.n_cols, 3);
    }

    #[test]
    fn test_rejects_wrong_format() {
        let mut buf = CoefficientBuffer::from_rows_i64(&[vec![1, 2]], 2);
        buf.format = Cow::Borrowed("d");
        assert_eq!(kind_of(buf.validate().unwrap_err()), BufferErrorKind::Format);

        let mut buf = CoefficientBuffer::from_rows_i64(&[vec![1, 2]], 2);
        buf.item_size = 4;
        assert_eq!(kind_of(buf.validate().unwrap_err()), BufferErrorKind::Format);

        let mut buf = CoefficientBuffer::from_rows_i64(&[vec![1, 2]], 2);
        buf.format = Cow::Borrowed("@l");
        assert!(buf.validate().is_ok());

        // Standard sizes make `l` a 4-byte code.
        for format in ["<l", "=i", "<<q", "x", "q<", ""] {
            let mut buf = CoefficientBuffer::from_rows_i64(&[vec![1, 2]], 2);
            buf.format = Cow::Borrowed(format);
            assert_eq!(kind_of(buf.validate().unwrap_err()), BufferErrorKind::Format, "{}", format);
        }
    }

    fn buffer_with_order(values: &[i64], format: &'static str, encode: fn(i64) -> [u8; 8]) -> CoefficientBuffer<'static> {
        let mut buf = CoefficientBuffer::from_rows_i64(&[values.to_vec()], values.len());
        buf.bytes = Cow::Owned(values.iter().flat_map(|&v| encode(v)).collect());
        buf.format = Cow::Borrowed(format);
        buf
    }

    #[test]
    fn test_decodes_byte_order_prefix() {
        let values = [1, 0, 5, -7];
        let cases: [(&'static str, fn(i64) -> [u8; 8]); 6] = [
            ("q", i64::to_ne_bytes),
            ("@q", i64::to_ne_bytes),
            ("=q", i64::to_ne_bytes),
            ("<q", i64::to_le_bytes),
            (">q", i64::to_be_bytes),
            ("!q", i64::to_be_bytes),
        ];
        for (format, encode) in cases {
            let rows = buffer_with_order(&values, format, encode).validate().unwrap();
            assert_eq!(rows.values, values, "{}", format);
        }
    }

    #[test]
    fn test_rejects_overflowing_shape() {
        let mut buf = CoefficientBuffer::from_rows_i64(&[vec![1, 2, 3, 4]], 4);
        buf.shape = vec![usize::MAX / 16, 4];
        assert_eq!(kind_of(buf.validate().unwrap_err()), BufferErrorKind::Length);

        let mut buf = CoefficientBuffer::from_rows_i64(&[vec![1, 2, 3, 4]], 4);
        buf.shape = vec![1, usize::MAX / 4];
        assert_eq!(kind_of(buf.validate().unwrap_err()), BufferErrorKind::Length);
    }

    #[test]
    fn test_rejects_wrong_rank() {
        let mut buf = CoefficientBuffer::from_rows_i64(&[vec![1, 2]], 2);
        buf.shape = vec![2];
        buf.strides = vec![8];
        assert_eq!(kind_of(buf.validate().unwrap_err()), BufferErrorKind::Rank);
    }

    #[test]
    fn test_rejects_non_contiguous() {
        // Column-major view of a 2x2 matrix.
        let mut buf = CoefficientBuffer::from_rows_i64(&[vec![1, 2], vec![3, 4]], 2);
        buf.strides = vec![8, 16];
        assert_eq!(kind_of(buf.validate().unwrap_err()), BufferErrorKind::NotContiguous);
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let buf = CoefficientBuffer::from_rows_i64(&[vec![1, 2], vec![3]], 2);
        assert_eq!(kind_of(buf.validate().unwrap_err()), BufferErrorKind::Length);
    }
}
