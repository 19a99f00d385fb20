//! Compressed sparse row matrices, borrowed ([CsrMatrix]) and owned ([CsrBuffer]).
use std::ops::Range;

use crate::error::InputError;
use crate::problem::check_len;

/// A borrowed matrix in compressed sparse row form.
///
/// Row `i` holds the entries `row_begin[i]..row_begin[i + 1]` of `values` and `col_index`.
/// `row_begin` may either have one entry per row, in which case the last row ends at the
/// number of nonzeros, or one extra trailing entry (the layout used by scipy's `indptr`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsrMatrix<'a> {
    /// All non-zero values, row by row
    pub values: &'a [f64],
    /// Offset of the first value of each row
    pub row_begin: &'a [usize],
    /// Column index of each value
    pub col_index: &'a [usize],
}

impl<'a> CsrMatrix<'a> {
    /// Number of stored values
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Range of `values` and `col_index` that belongs to row `i`
    pub fn row_range(&self, i: usize) -> Range<usize> {
        let end = self.row_begin.get(i + 1).copied().unwrap_or_else(|| self.nnz());
        self.row_begin[i]..end
    }

    /// Column indices and values of row `i`
    pub fn row(&self, i: usize) -> (&'a [usize], &'a [f64]) {
        let range = self.row_range(i);
        (&self.col_index[range.clone()], &self.values[range])
    }

    /// Check that this matrix has `rows` well formed rows and that every column index is below `cols`
    pub fn validate(&self, rows: usize, cols: usize) -> Result<(), InputError> {
        check_len("column indices", self.nnz(), self.col_index.len())?;
        if !matches!(self.row_begin.len().checked_sub(rows), Some(0 | 1)) {
            return Err(InputError::DimensionMismatch {
                what: "row offsets",
                expected: rows,
                found: self.row_begin.len(),
            });
        }
        // the offsets, completed with the end of the last row, must go from 0 to nnz
        let nnz = self.nnz();
        let end = (self.row_begin.len() == rows).then_some(nnz);
        let mut previous = 0;
        for (row, offset) in self.row_begin.iter().copied().chain(end).enumerate() {
            let in_order = offset >= previous && offset <= nnz;
            let pinned = (row != 0 || offset == 0) && (row != rows || offset == nnz);
            if !(in_order && pinned) {
                return Err(InputError::InvalidRowOffset { row, offset, nnz });
            }
            previous = offset;
        }
        if let Some(position) = self.col_index.iter().position(|&j| j >= cols) {
            return Err(InputError::ColumnOutOfRange {
                position,
                column: self.col_index[position],
                cols,
            });
        }
        Ok(())
    }
}

/// An owned compressed sparse row matrix, built row by row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsrBuffer {
    values: Vec<f64>,
    row_begin: Vec<usize>,
    col_index: Vec<usize>,
}

impl CsrBuffer {
    /// An empty matrix with no rows
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a dense row-major matrix, keeping only the entries that are not exactly zero
    pub fn from_dense(matrix: &[f64], cols: usize) -> Self {
        let mut csr = CsrBuffer::new();
        for row in matrix.chunks(cols.max(1)) {
            csr.push_dense_row(row);
        }
        csr
    }

    /// Append a row given as parallel column indices and values
    pub fn push_row(&mut self, indices: &[usize], values: &[f64]) {
        self.row_begin.push(self.values.len());
        self.col_index.extend_from_slice(indices);
        self.values.extend_from_slice(values);
    }

    /// Append a dense row, dropping the entries that are exactly zero
    pub fn push_dense_row(&mut self, row: &[f64]) {
        self.row_begin.push(self.values.len());
        for (j, &value) in row.iter().enumerate() {
            if value != 0. {
                self.col_index.push(j);
                self.values.push(value);
            }
        }
    }

    /// Copy the first `rows` rows of a borrowed matrix
    pub fn from_matrix(matrix: CsrMatrix<'_>, rows: usize) -> Self {
        let mut csr = CsrBuffer::new();
        for i in 0..rows {
            let (indices, values) = matrix.row(i);
            csr.push_row(indices, values);
        }
        csr
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.row_begin.len()
    }

    /// Borrow this matrix
    pub fn as_matrix(&self) -> CsrMatrix<'_> {
        CsrMatrix {
            values: &self.values,
            row_begin: &self.row_begin,
            col_index: &self.col_index,
        }
    }
}
