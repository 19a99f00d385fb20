//! An engine that does not solve anything: it records the calls it receives and reports a
//! scripted outcome. It shows exactly how a problem is transcribed.
//!
//! ```
//! use stdlp::solvers::recording::{Call, RecordingEngine};
//! use stdlp::{dense_solve, Columns, DenseProblem, SolverConfig};
//!
//! let engine = RecordingEngine::new().with_solution(2., vec![2.]);
//! let problem = DenseProblem {
//!     rows: 1,
//!     cols: 1,
//!     quadratic: None,
//!     matrix: &[-1.],
//!     columns: Columns {
//!         objective: &[1.],
//!         rhs: &[-2.],
//!         lower: &[0.],
//!         upper: &[10.],
//!         var_types: None,
//!         n_eq: 0,
//!     },
//! };
//! let solution = dense_solve(&engine, &problem, &SolverConfig::quiet()).unwrap();
//! assert_eq!(solution.values(), &[2.]);
//! assert!(engine.calls().contains(&Call::Optimize));
//! ```
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::lookup_int_param;
use crate::csr::CsrMatrix;
use crate::problem::{Sense, VarType};
use crate::solvers::{
    EngineError, Environment, ErrorKind, ModelHandle, ModelSpec, SolverEngine, Status,
};

/// One call received by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// An environment was opened
    OpenEnvironment {
        /// Its log file
        log_file: Option<PathBuf>,
    },
    /// A model was created
    NewModel {
        /// Model name
        name: String,
        /// Linear objective
        objective: Vec<f64>,
        /// Lower bounds
        lower: Vec<f64>,
        /// Upper bounds
        upper: Vec<f64>,
        /// Variable types
        var_types: Vec<VarType>,
    },
    /// A single constraint was added
    AddConstraint {
        /// Column indices
        indices: Vec<usize>,
        /// Coefficients
        values: Vec<f64>,
        /// Sense
        sense: Sense,
        /// Right hand side
        rhs: f64,
    },
    /// A block of constraints was added from a CSR matrix
    AddConstraints {
        /// Row offsets, as received
        row_begin: Vec<usize>,
        /// Column indices
        indices: Vec<usize>,
        /// Coefficients
        values: Vec<f64>,
        /// Senses
        senses: Vec<Sense>,
        /// Right hand sides
        rhs: Vec<f64>,
    },
    /// Quadratic objective terms were added
    AddQuadraticTerms {
        /// Row indices
        rows: Vec<usize>,
        /// Column indices
        cols: Vec<usize>,
        /// Coefficients
        values: Vec<f64>,
    },
    /// An integer parameter was set
    SetIntParam {
        /// Parameter name, as received
        name: String,
        /// Value
        value: i32,
    },
    /// The model was optimized
    Optimize,
    /// The model was dropped
    FreeModel,
    /// The environment was dropped
    FreeEnvironment,
}

/// The kind of a [Call], used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// [Call::OpenEnvironment]
    OpenEnvironment,
    /// [Call::NewModel]
    NewModel,
    /// [Call::AddConstraint] and [Call::AddConstraints]
    AddConstraint,
    /// [Call::AddQuadraticTerms]
    AddQuadraticTerms,
    /// [Call::SetIntParam]
    SetIntParam,
    /// [Call::Optimize]
    Optimize,
}

/// A constraint row, whether it was added alone or in a block
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRow {
    /// Column indices
    pub indices: Vec<usize>,
    /// Coefficients
    pub values: Vec<f64>,
    /// Sense
    pub sense: Sense,
    /// Right hand side
    pub rhs: f64,
}

#[derive(Debug, Clone)]
struct Script {
    status: Status,
    objective: f64,
    x: Option<Vec<f64>>,
    fail_on: Option<CallKind>,
}

/// The recording engine. Clones share the same call log.
#[derive(Debug, Clone)]
pub struct RecordingEngine {
    calls: Rc<RefCell<Vec<Call>>>,
    script: Script,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        RecordingEngine {
            calls: Rc::default(),
            script: Script {
                status: Status::Optimal,
                objective: 0.,
                x: None,
                fail_on: None,
            },
        }
    }
}

impl RecordingEngine {
    /// An engine reporting an optimal solution at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Report this status after optimizing
    pub fn with_status(mut self, status: Status) -> Self {
        self.script.status = status;
        self
    }

    /// Report this objective value and solution
    pub fn with_solution(mut self, objective: f64, x: Vec<f64>) -> Self {
        self.script.objective = objective;
        self.script.x = Some(x);
        self
    }

    /// Fail the first call of this kind, after recording it
    pub fn failing_on(mut self, kind: CallKind) -> Self {
        self.script.fail_on = Some(kind);
        self
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Forget the calls received so far
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Every constraint row received so far, in order
    pub fn constraint_rows(&self) -> Vec<RecordedRow> {
        let mut rows = Vec::new();
        for call in self.calls.borrow().iter() {
            match call {
                Call::AddConstraint {
                    indices,
                    values,
                    sense,
                    rhs,
                } => rows.push(RecordedRow {
                    indices: indices.clone(),
                    values: values.clone(),
                    sense: *sense,
                    rhs: *rhs,
                }),
                Call::AddConstraints {
                    row_begin,
                    indices,
                    values,
                    senses,
                    rhs,
                } => {
                    let matrix = CsrMatrix {
                        values,
                        row_begin,
                        col_index: indices,
                    };
                    for (i, (&sense, &rhs)) in senses.iter().zip(rhs).enumerate() {
                        let (indices, values) = matrix.row(i);
                        rows.push(RecordedRow {
                            indices: indices.to_vec(),
                            values: values.to_vec(),
                            sense,
                            rhs,
                        });
                    }
                }
                _ => {}
            }
        }
        rows
    }

    /// Every quadratic term received so far, as `(row, column, value)`
    pub fn quadratic_terms(&self) -> Vec<(usize, usize, f64)> {
        self.calls
            .borrow()
            .iter()
            .flat_map(|call| match call {
                Call::AddQuadraticTerms { rows, cols, values } => rows
                    .iter()
                    .zip(cols)
                    .zip(values)
                    .map(|((&i, &j), &q)| (i, j, q))
                    .collect(),
                _ => Vec::new(),
            })
            .collect()
    }

    fn record(&self, call: Call, kind: Option<CallKind>) -> Result<(), EngineError> {
        self.calls.borrow_mut().push(call);
        match (kind, self.script.fail_on) {
            (Some(kind), Some(fail_on)) if kind == fail_on => Err(EngineError::new(
                ErrorKind::Internal,
                format!("injected failure on {:?}", kind),
            )),
            _ => Ok(()),
        }
    }
}

impl SolverEngine for RecordingEngine {
    type Environment = RecordingEnvironment;

    fn name(&self) -> &'static str {
        "recording"
    }

    fn open_environment(&self, log_file: Option<&Path>) -> Result<RecordingEnvironment, EngineError> {
        self.record(
            Call::OpenEnvironment {
                log_file: log_file.map(Path::to_path_buf),
            },
            Some(CallKind::OpenEnvironment),
        )?;
        Ok(RecordingEnvironment {
            engine: self.clone(),
        })
    }
}

/// The environment of a [RecordingEngine]
#[derive(Debug)]
pub struct RecordingEnvironment {
    engine: RecordingEngine,
}

impl Drop for RecordingEnvironment {
    fn drop(&mut self) {
        self.engine.calls.borrow_mut().push(Call::FreeEnvironment);
    }
}

impl Environment for RecordingEnvironment {
    type Model<'env> = RecordingModel<'env>;

    fn new_model<'env>(&'env self, spec: ModelSpec<'_>) -> Result<RecordingModel<'env>, EngineError> {
        self.engine.record(
            Call::NewModel {
                name: spec.name.to_string(),
                objective: spec.objective.to_vec(),
                lower: spec.lower.to_vec(),
                upper: spec.upper.to_vec(),
                var_types: spec.var_types.to_vec(),
            },
            Some(CallKind::NewModel),
        )?;
        Ok(RecordingModel {
            engine: &self.engine,
            cols: spec.cols(),
            optimized: false,
        })
    }
}

/// A model of a [RecordingEngine]
#[derive(Debug)]
pub struct RecordingModel<'env> {
    engine: &'env RecordingEngine,
    cols: usize,
    optimized: bool,
}

impl<'env> RecordingModel<'env> {
    fn check_columns(&self, indices: &[usize]) -> Result<(), EngineError> {
        match indices.iter().find(|&&j| j >= self.cols) {
            Some(j) => Err(EngineError::new(
                ErrorKind::IndexOutOfRange,
                format!("index {} is out of range for {} variables", j, self.cols),
            )),
            None => Ok(()),
        }
    }

    fn solution_available(&self) -> Result<(), EngineError> {
        if self.optimized && self.engine.script.status.is_optimal() {
            Ok(())
        } else {
            Err(EngineError::new(
                ErrorKind::DataNotAvailable,
                "no solution available",
            ))
        }
    }
}

impl<'env> Drop for RecordingModel<'env> {
    fn drop(&mut self) {
        self.engine.calls.borrow_mut().push(Call::FreeModel);
    }
}

impl<'env> ModelHandle for RecordingModel<'env> {
    fn add_constraint(
        &mut self,
        indices: &[usize],
        values: &[f64],
        sense: Sense,
        rhs: f64,
    ) -> Result<(), EngineError> {
        self.engine.record(
            Call::AddConstraint {
                indices: indices.to_vec(),
                values: values.to_vec(),
                sense,
                rhs,
            },
            Some(CallKind::AddConstraint),
        )?;
        self.check_columns(indices)
    }

    fn add_constraints(
        &mut self,
        matrix: CsrMatrix<'_>,
        senses: &[Sense],
        rhs: &[f64],
    ) -> Result<(), EngineError> {
        self.engine.record(
            Call::AddConstraints {
                row_begin: matrix.row_begin.to_vec(),
                indices: matrix.col_index.to_vec(),
                values: matrix.values.to_vec(),
                senses: senses.to_vec(),
                rhs: rhs.to_vec(),
            },
            Some(CallKind::AddConstraint),
        )?;
        self.check_columns(matrix.col_index)
    }

    fn add_quadratic_terms(
        &mut self,
        rows: &[usize],
        cols: &[usize],
        values: &[f64],
    ) -> Result<(), EngineError> {
        self.engine.record(
            Call::AddQuadraticTerms {
                rows: rows.to_vec(),
                cols: cols.to_vec(),
                values: values.to_vec(),
            },
            Some(CallKind::AddQuadraticTerms),
        )?;
        self.check_columns(rows)?;
        self.check_columns(cols)
    }

    fn set_int_param(&mut self, name: &str, value: i32) -> Result<(), EngineError> {
        self.engine.record(
            Call::SetIntParam {
                name: name.to_string(),
                value,
            },
            Some(CallKind::SetIntParam),
        )?;
        lookup_int_param(name, value).map(|_| ())
    }

    fn optimize(&mut self) -> Result<(), EngineError> {
        self.engine.record(Call::Optimize, Some(CallKind::Optimize))?;
        self.optimized = true;
        Ok(())
    }

    fn status(&self) -> Result<Status, EngineError> {
        Ok(if self.optimized {
            self.engine.script.status
        } else {
            Status::Loaded
        })
    }

    fn objective_value(&self) -> Result<f64, EngineError> {
        self.solution_available()?;
        Ok(self.engine.script.objective)
    }

    fn solution(&self, out: &mut [f64]) -> Result<(), EngineError> {
        self.solution_available()?;
        match &self.engine.script.x {
            Some(x) if x.len() == out.len() => out.copy_from_slice(x),
            Some(x) => {
                return Err(EngineError::new(
                    ErrorKind::InvalidArgument,
                    format!("scripted solution has {} values, not {}", x.len(), out.len()),
                ))
            }
            None => out.iter_mut().for_each(|v| *v = 0.),
        }
        Ok(())
    }
}
