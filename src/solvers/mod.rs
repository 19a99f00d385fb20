//! The solver engine capability surface, and the engines shipped with this crate.
//!
//! An engine is used in three nested steps, mirroring the C API of commercial solvers:
//! a [SolverEngine] opens an [Environment], the environment creates models
//! ([ModelHandle]) that borrow it, and the model receives constraints, quadratic terms and
//! parameters before being optimized. Dropping a handle releases it.
use std::path::Path;

use thiserror::Error;

use crate::csr::CsrMatrix;
use crate::problem::{Sense, VarType};

pub mod batch;
#[cfg(feature = "clarabel")]
pub mod clarabel;
#[cfg(feature = "highs")]
pub mod highs;
#[cfg(feature = "microlp")]
pub mod microlp;
pub mod recording;

/// The outcome of an optimize call, numbered like the status codes of most commercial solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The model was loaded but not solved
    Loaded = 1,
    /// An optimal solution was found
    Optimal = 2,
    /// The model was proven infeasible
    Infeasible = 3,
    /// The model is either infeasible or unbounded
    InfOrUnbd = 4,
    /// The model was proven unbounded
    Unbounded = 5,
    /// The objective is worse than the cutoff
    Cutoff = 6,
    /// The iteration limit was reached
    IterationLimit = 7,
    /// The node limit was reached
    NodeLimit = 8,
    /// The time limit was reached
    TimeLimit = 9,
    /// The solution count limit was reached
    SolutionLimit = 10,
    /// The optimization was interrupted
    Interrupted = 11,
    /// The solver hit unrecoverable numerical difficulties
    Numeric = 12,
    /// A solution was found, but not to the requested tolerances
    Suboptimal = 13,
    /// The optimization is still running
    InProgress = 14,
}

impl Status {
    /// The integer code of this status
    pub fn code(self) -> i32 {
        self as i32
    }

    /// The status with this integer code, if any
    pub fn from_code(code: i32) -> Option<Status> {
        use Status::*;
        [
            Loaded,
            Optimal,
            Infeasible,
            InfOrUnbd,
            Unbounded,
            Cutoff,
            IterationLimit,
            NodeLimit,
            TimeLimit,
            SolutionLimit,
            Interrupted,
            Numeric,
            Suboptimal,
            InProgress,
        ]
        .iter()
        .copied()
        .find(|s| s.code() == code)
    }

    /// Whether this is the only status for which a solution is extracted
    pub fn is_optimal(self) -> bool {
        self == Status::Optimal
    }
}

/// The class of an engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An argument is malformed
    InvalidArgument,
    /// The requested result does not exist, for instance because the model was not solved
    DataNotAvailable,
    /// A row or column index does not exist
    IndexOutOfRange,
    /// No parameter has this name
    UnknownParameter,
    /// The parameter exists but does not accept this value
    ValueOutOfRange,
    /// The log file could not be opened
    FileWrite,
    /// The engine cannot handle this kind of model
    NotSupported,
    /// The underlying solver failed
    Internal,
}

impl ErrorKind {
    /// The numeric code reported alongside the message
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::InvalidArgument => 1,
            ErrorKind::DataNotAvailable => 2,
            ErrorKind::IndexOutOfRange => 3,
            ErrorKind::UnknownParameter => 4,
            ErrorKind::ValueOutOfRange => 5,
            ErrorKind::FileWrite => 6,
            ErrorKind::NotSupported => 7,
            ErrorKind::Internal => 8,
        }
    }
}

/// A failed engine call, with the engine's human readable explanation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (error code {})", .kind.code())]
pub struct EngineError {
    /// What went wrong
    pub kind: ErrorKind,
    /// The engine's message
    pub message: String,
}

impl EngineError {
    /// Create an error
    pub fn new<M: Into<String>>(kind: ErrorKind, message: M) -> Self {
        EngineError {
            kind,
            message: message.into(),
        }
    }
}

/// What a new model is seeded with: one variable per objective coefficient
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec<'a> {
    /// A name for logs
    pub name: &'a str,
    /// Linear objective coefficients
    pub objective: &'a [f64],
    /// Lower bounds
    pub lower: &'a [f64],
    /// Upper bounds
    pub upper: &'a [f64],
    /// Variable types
    pub var_types: &'a [VarType],
}

impl<'a> ModelSpec<'a> {
    /// Number of variables
    pub fn cols(&self) -> usize {
        self.objective.len()
    }
}

/// A solver engine, the entry point to open environments.
pub trait SolverEngine {
    /// The environment type of this engine
    type Environment: Environment;

    /// A short name for logs
    fn name(&self) -> &'static str;

    /// Open an environment that writes its log to `log_file`, if given
    fn open_environment(&self, log_file: Option<&Path>) -> Result<Self::Environment, EngineError>;
}

/// An open engine environment. Models borrow it, so it outlives all of them.
pub trait Environment {
    /// The model type of this environment
    type Model<'env>: ModelHandle
    where
        Self: 'env;

    /// Create a model with `spec.cols()` variables and no constraints
    fn new_model<'env>(&'env self, spec: ModelSpec<'_>) -> Result<Self::Model<'env>, EngineError>;
}

/// A model inside an engine environment.
pub trait ModelHandle {
    /// Add one constraint `sum(values[k] * x[indices[k]]) sense rhs`
    fn add_constraint(
        &mut self,
        indices: &[usize],
        values: &[f64],
        sense: Sense,
        rhs: f64,
    ) -> Result<(), EngineError>;

    /// Add one constraint per row of `matrix`
    fn add_constraints(
        &mut self,
        matrix: CsrMatrix<'_>,
        senses: &[Sense],
        rhs: &[f64],
    ) -> Result<(), EngineError> {
        if senses.len() != rhs.len() {
            return Err(EngineError::new(
                ErrorKind::InvalidArgument,
                format!("{} senses for {} right hand sides", senses.len(), rhs.len()),
            ));
        }
        matrix
            .validate(senses.len(), usize::MAX)
            .map_err(|e| EngineError::new(ErrorKind::InvalidArgument, e.to_string()))?;
        for (i, (&sense, &rhs)) in senses.iter().zip(rhs).enumerate() {
            let (indices, values) = matrix.row(i);
            self.add_constraint(indices, values, sense, rhs)?;
        }
        Ok(())
    }

    /// Add the objective terms `values[k] * x[rows[k]] * x[cols[k]]`
    fn add_quadratic_terms(
        &mut self,
        rows: &[usize],
        cols: &[usize],
        values: &[f64],
    ) -> Result<(), EngineError>;

    /// Set an integer parameter of this model
    fn set_int_param(&mut self, name: &str, value: i32) -> Result<(), EngineError>;

    /// Run the optimization. Blocks until the solver is done
    fn optimize(&mut self) -> Result<(), EngineError>;

    /// The status of the last optimization
    fn status(&self) -> Result<Status, EngineError>;

    /// The objective value of the solution
    fn objective_value(&self) -> Result<f64, EngineError>;

    /// Write the solution into `out`, which must have one slot per variable
    fn solution(&self, out: &mut [f64]) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(Status::Optimal.code(), 2);
        assert_eq!(Status::from_code(5), Some(Status::Unbounded));
        assert_eq!(Status::from_code(14), Some(Status::InProgress));
        assert_eq!(Status::from_code(0), None);
        assert!(Status::Optimal.is_optimal());
        assert!(!Status::Suboptimal.is_optimal());
    }

    #[test]
    fn error_message_has_code() {
        let e = EngineError::new(ErrorKind::UnknownParameter, "unknown parameter 'x'");
        assert_eq!(e.to_string(), "unknown parameter 'x' (error code 4)");
    }
}
