//! Transcription of dense and sparse inputs into engine calls.
//!
//! Entries are kept when they are different from zero, compared exactly: there is no
//! tolerance, a coefficient of `1e-300` is transcribed like any other.
use crate::csr::CsrMatrix;
use crate::problem::{Sense, VarType};
use crate::solvers::{EngineError, ModelHandle};

/// Rows `0..n_eq` are equalities, the remaining ones are `<=` inequalities
pub fn constraint_senses(rows: usize, n_eq: usize) -> Vec<Sense> {
    (0..rows)
        .map(|i| {
            if i < n_eq {
                Sense::Equal
            } else {
                Sense::LessEqual
            }
        })
        .collect()
}

/// Translate type codes with [VarType::from_code]. Without codes, every variable is continuous.
pub fn variable_types(cols: usize, codes: Option<&[i32]>) -> Vec<VarType> {
    match codes {
        Some(codes) => codes.iter().take(cols).map(|&c| VarType::from_code(c)).collect(),
        None => vec![VarType::Continuous; cols],
    }
}

/// Scratch space collecting the nonzero entries of one dense row at a time
#[derive(Debug, Default)]
pub struct DenseRowScanner {
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl DenseRowScanner {
    /// Scratch space for rows of `cols` entries
    pub fn with_capacity(cols: usize) -> Self {
        DenseRowScanner {
            indices: Vec::with_capacity(cols),
            values: Vec::with_capacity(cols),
        }
    }

    /// The column indices and values of the nonzero entries of `row`
    pub fn scan(&mut self, row: &[f64]) -> (&[usize], &[f64]) {
        self.indices.clear();
        self.values.clear();
        for (j, &value) in row.iter().enumerate() {
            if value != 0. {
                self.indices.push(j);
                self.values.push(value);
            }
        }
        (&self.indices, &self.values)
    }
}

/// Add one constraint per row of the dense `matrix`, rows without nonzeros included
pub fn add_dense_rows(
    model: &mut dyn ModelHandle,
    matrix: &[f64],
    cols: usize,
    senses: &[Sense],
    rhs: &[f64],
) -> Result<(), EngineError> {
    let mut scanner = DenseRowScanner::with_capacity(cols);
    for ((row, &sense), &rhs) in matrix.chunks(cols).zip(senses).zip(rhs) {
        let (indices, values) = scanner.scan(row);
        model.add_constraint(indices, values, sense, rhs)?;
    }
    Ok(())
}

/// Add all rows of a CSR matrix in a single call, without looking at them
pub fn add_sparse_rows(
    model: &mut dyn ModelHandle,
    matrix: CsrMatrix<'_>,
    senses: &[Sense],
    rhs: &[f64],
) -> Result<(), EngineError> {
    model.add_constraints(matrix, senses, rhs)
}

/// The nonzero entries of a dense quadratic objective, as parallel arrays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadraticTerms {
    /// Row index of each term
    pub rows: Vec<usize>,
    /// Column index of each term
    pub cols: Vec<usize>,
    /// Coefficient of each term
    pub values: Vec<f64>,
}

impl QuadraticTerms {
    /// Collect every nonzero `q[i][j]` of the `cols × cols` row-major matrix `q`.
    /// `(i, j)` and `(j, i)` are distinct terms: nothing is halved or merged.
    pub fn from_dense(q: &[f64], cols: usize) -> Self {
        let mut terms = QuadraticTerms::default();
        for (i, row) in q.chunks(cols.max(1)).enumerate() {
            for (j, &value) in row.iter().enumerate() {
                if value != 0. {
                    terms.rows.push(i);
                    terms.cols.push(j);
                    terms.values.push(value);
                }
            }
        }
        terms
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no terms
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add all the terms in a single call
    pub fn add_to(&self, model: &mut dyn ModelHandle) -> Result<(), EngineError> {
        model.add_quadratic_terms(&self.rows, &self.cols, &self.values)
    }
}
