//! Errors returned by the solve entry points.
use thiserror::Error;

use crate::solvers::{EngineError, Status};

/// The caller's input cannot be transcribed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A problem needs at least one variable
    #[error("the problem has no variables")]
    NoVariables,
    /// A slice does not have the length implied by the problem dimensions
    #[error("{what}: expected {expected} values, found {found}")]
    DimensionMismatch {
        /// Which input is wrong
        what: &'static str,
        /// Length implied by the dimensions
        expected: usize,
        /// Actual length
        found: usize,
    },
    /// The dimensions describe more elements than memory can address
    #[error("a {rows} × {cols} matrix is too large")]
    TooLarge {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },
    /// The equality prefix is longer than the constraint matrix
    #[error("{n_eq} equality constraints requested, but there are only {rows} rows")]
    TooManyEqualities {
        /// Requested number of equality rows
        n_eq: usize,
        /// Number of rows in the matrix
        rows: usize,
    },
    /// The CSR row offsets are out of order or do not span exactly the stored values
    #[error("row {row} starts at offset {offset}, which is not valid for {nnz} nonzeros")]
    InvalidRowOffset {
        /// Index of the faulty row
        row: usize,
        /// Its offset
        offset: usize,
        /// Number of stored values
        nnz: usize,
    },
    /// A CSR column index does not name a variable
    #[error("nonzero {position} is in column {column}, but there are only {cols} columns")]
    ColumnOutOfRange {
        /// Position of the value in the CSR arrays
        position: usize,
        /// Its column index
        column: usize,
        /// Number of variables
        cols: usize,
    },
    /// The sparse path only transcribes linear objectives
    #[error("a quadratic objective cannot be combined with a sparse constraint matrix")]
    QuadraticWithSparse,
}

/// An error that prevented the solve call from reaching a status.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// The problem is malformed; no engine call was made
    #[error("invalid problem: {0}")]
    InvalidInput(#[from] InputError),
    /// An engine call failed
    #[error(transparent)]
    Solver(#[from] EngineError),
}

/// Represents an error that occurred when solving a problem
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    /// The problem is [unbounded](https://www.matem.unam.mx/~omar/math340/unbounded.html).
    /// It doesn't have a finite optimal values for its variables.
    /// The objective can be made infinitely large without violating any constraints.
    #[error("the problem is unbounded")]
    Unbounded,
    ///  There exists no solution that satisfies all of the constraints
    #[error("the problem is infeasible")]
    Infeasible,
    /// The solver stopped before proving optimality
    #[error("the solver stopped with status {0:?}")]
    NotOptimal(Status),
    /// The problem is malformed
    #[error("invalid problem: {0}")]
    InvalidInput(InputError),
    /// An engine call failed
    #[error(transparent)]
    Solver(EngineError),
}

impl From<SolveError> for ResolutionError {
    fn from(error: SolveError) -> Self {
        match error {
            SolveError::InvalidInput(e) => ResolutionError::InvalidInput(e),
            SolveError::Solver(e) => ResolutionError::Solver(e),
        }
    }
}

impl From<InputError> for ResolutionError {
    fn from(error: InputError) -> Self {
        ResolutionError::InvalidInput(error)
    }
}

impl ResolutionError {
    /// Classify a status that is not [Status::Optimal]
    pub fn from_status(status: Status) -> Self {
        match status {
            Status::Infeasible | Status::InfOrUnbd => ResolutionError::Infeasible,
            Status::Unbounded => ResolutionError::Unbounded,
            other => ResolutionError::NotOptimal(other),
        }
    }
}
