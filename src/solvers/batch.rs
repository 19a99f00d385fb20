//! Environment and model handles for solvers that take the whole problem at once.
//!
//! Pure rust solvers have no incremental C API: the model handle stores everything it
//! receives in a [ModelData] and hands it to a [BatchSolver] when it is optimized.
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use fnv::FnvHashMap;

use crate::config::{lookup_int_param, INT_PARAMS, LOG_TO_CONSOLE};
use crate::csr::CsrBuffer;
use crate::problem::{Sense, VarType};
use crate::solvers::{EngineError, Environment, ErrorKind, ModelHandle, ModelSpec, Status};

/// A solver that receives a complete model and returns its outcome
pub trait BatchSolver {
    /// A short name for logs
    const NAME: &'static str;

    /// Solve the model. Infeasible or unbounded models are reported through the status,
    /// errors are reserved for models the solver cannot process.
    fn solve(&self, model: &ModelData, log: &SolverLog) -> Result<Outcome, EngineError>;
}

/// What a [BatchSolver] found
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The final status
    pub status: Status,
    /// Objective value, meaningful when `x` is not empty
    pub objective: f64,
    /// Variable values, empty when no solution is available
    pub x: Vec<f64>,
}

impl Outcome {
    /// An outcome without a solution
    pub fn without_solution(status: Status) -> Self {
        Outcome {
            status,
            objective: f64::NAN,
            x: Vec::new(),
        }
    }
}

/// The log of an environment: an optional file, and an optional echo on standard output
#[derive(Debug)]
pub struct SolverLog {
    file: Option<File>,
    path: Option<PathBuf>,
}

impl SolverLog {
    /// Open (or create) `path` in append mode
    pub fn open(path: Option<&Path>) -> Result<Self, EngineError> {
        let file = match path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        EngineError::new(
                            ErrorKind::FileWrite,
                            format!("unable to open log file {}: {}", path.display(), e),
                        )
                    })?,
            ),
            None => None,
        };
        Ok(SolverLog {
            file,
            path: path.map(Path::to_path_buf),
        })
    }

    /// The path of the log file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write a line to the log file, and to standard output if `console` is set
    pub fn line(&self, console: bool, line: &str) {
        if console {
            println!("{}", line);
        }
        if let Some(file) = &self.file {
            let mut out: &File = file;
            if let Err(e) = writeln!(out, "{}", line) {
                log::warn!("unable to write to the solver log: {}", e);
            }
        }
    }
}

/// Everything a model handle received
#[derive(Debug, Clone)]
pub struct ModelData {
    /// Model name
    pub name: String,
    /// Linear objective
    pub objective: Vec<f64>,
    /// Lower bounds
    pub lower: Vec<f64>,
    /// Upper bounds
    pub upper: Vec<f64>,
    /// Variable types
    pub var_types: Vec<VarType>,
    /// Constraint rows
    pub rows: CsrBuffer,
    /// Sense of each row
    pub senses: Vec<Sense>,
    /// Right hand side of each row
    pub rhs: Vec<f64>,
    /// Quadratic objective terms `(i, j, q)` standing for `q * x_i * x_j`
    pub quadratic: Vec<(usize, usize, f64)>,
    params: FnvHashMap<&'static str, i32>,
}

impl ModelData {
    fn new(spec: ModelSpec<'_>) -> Result<Self, EngineError> {
        let cols = spec.cols();
        for (what, len) in [
            ("lower bounds", spec.lower.len()),
            ("upper bounds", spec.upper.len()),
            ("variable types", spec.var_types.len()),
        ] {
            if len != cols {
                return Err(EngineError::new(
                    ErrorKind::InvalidArgument,
                    format!("{} has {} entries for {} variables", what, len, cols),
                ));
            }
        }
        Ok(ModelData {
            name: spec.name.to_string(),
            objective: spec.objective.to_vec(),
            lower: spec.lower.to_vec(),
            upper: spec.upper.to_vec(),
            var_types: spec.var_types.to_vec(),
            rows: CsrBuffer::new(),
            senses: Vec::new(),
            rhs: Vec::new(),
            quadratic: Vec::new(),
            params: FnvHashMap::default(),
        })
    }

    /// Number of variables
    pub fn cols(&self) -> usize {
        self.objective.len()
    }

    /// Number of constraint rows
    pub fn num_rows(&self) -> usize {
        self.senses.len()
    }

    /// Iterate over `(indices, values, sense, rhs)` for every row
    pub fn iter_rows(&self) -> impl Iterator<Item = (&[usize], &[f64], Sense, f64)> + '_ {
        let matrix = self.rows.as_matrix();
        (0..self.num_rows()).map(move |i| {
            let (indices, values) = matrix.row(i);
            (indices, values, self.senses[i], self.rhs[i])
        })
    }

    /// The value of an integer parameter, or its default
    pub fn param(&self, name: &str) -> i32 {
        match self.params.get(name) {
            Some(&value) => value,
            None => INT_PARAMS
                .iter()
                .find(|p| p.name == name)
                .map_or(0, |p| p.default),
        }
    }

    /// Whether the log should be echoed on the console
    pub fn log_to_console(&self) -> bool {
        self.param(LOG_TO_CONSOLE) != 0
    }

    /// Objective value of `x`, linear and quadratic parts included
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        let linear: f64 = self.objective.iter().zip(x).map(|(c, x)| c * x).sum();
        let quadratic: f64 = self.quadratic.iter().map(|&(i, j, q)| q * x[i] * x[j]).sum();
        linear + quadratic
    }

    fn check_index(&self, what: &str, index: usize) -> Result<(), EngineError> {
        if index < self.cols() {
            Ok(())
        } else {
            Err(EngineError::new(
                ErrorKind::IndexOutOfRange,
                format!("{} index {} is out of range for {} variables", what, index, self.cols()),
            ))
        }
    }

    fn add_row(
        &mut self,
        indices: &[usize],
        values: &[f64],
        sense: Sense,
        rhs: f64,
    ) -> Result<(), EngineError> {
        if indices.len() != values.len() {
            return Err(EngineError::new(
                ErrorKind::InvalidArgument,
                format!("{} indices for {} values", indices.len(), values.len()),
            ));
        }
        for &j in indices {
            self.check_index("column", j)?;
        }
        self.rows.push_row(indices, values);
        self.senses.push(sense);
        self.rhs.push(rhs);
        Ok(())
    }

    fn add_terms(&mut self, rows: &[usize], cols: &[usize], values: &[f64]) -> Result<(), EngineError> {
        if rows.len() != values.len() || cols.len() != values.len() {
            return Err(EngineError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "{} row indices and {} column indices for {} quadratic values",
                    rows.len(),
                    cols.len(),
                    values.len()
                ),
            ));
        }
        for (&i, &j) in rows.iter().zip(cols) {
            self.check_index("row", i)?;
            self.check_index("column", j)?;
        }
        self.quadratic.extend(
            rows.iter()
                .zip(cols)
                .zip(values)
                .map(|((&i, &j), &q)| (i, j, q)),
        );
        Ok(())
    }
}

/// The environment of a [BatchSolver]
#[derive(Debug)]
pub struct BatchEnvironment<S> {
    solver: S,
    log: SolverLog,
}

impl<S: BatchSolver> BatchEnvironment<S> {
    /// Open an environment around `solver`
    pub fn open(solver: S, log_file: Option<&Path>) -> Result<Self, EngineError> {
        let log = SolverLog::open(log_file)?;
        log::debug!("{} environment opened (log file: {:?})", S::NAME, log.path());
        Ok(BatchEnvironment { solver, log })
    }
}

impl<S> Drop for BatchEnvironment<S> {
    fn drop(&mut self) {
        log::debug!("environment released");
    }
}

impl<S: BatchSolver> Environment for BatchEnvironment<S> {
    type Model<'env> = BatchModel<'env, S> where Self: 'env;

    fn new_model<'env>(&'env self, spec: ModelSpec<'_>) -> Result<BatchModel<'env, S>, EngineError> {
        Ok(BatchModel {
            env: self,
            data: ModelData::new(spec)?,
            outcome: None,
        })
    }
}

/// A model of a [BatchSolver], alive as long as its environment
#[derive(Debug)]
pub struct BatchModel<'env, S> {
    env: &'env BatchEnvironment<S>,
    data: ModelData,
    outcome: Option<Outcome>,
}

impl<'env, S: BatchSolver> BatchModel<'env, S> {
    /// What the model received so far
    pub fn data(&self) -> &ModelData {
        &self.data
    }

    fn solved(&self) -> Result<&Outcome, EngineError> {
        match &self.outcome {
            Some(outcome) if !outcome.x.is_empty() => Ok(outcome),
            _ => Err(EngineError::new(
                ErrorKind::DataNotAvailable,
                format!("model '{}' has no solution", self.data.name),
            )),
        }
    }
}

impl<'env, S> Drop for BatchModel<'env, S> {
    fn drop(&mut self) {
        log::debug!("model '{}' freed", self.data.name);
    }
}

impl<'env, S: BatchSolver> ModelHandle for BatchModel<'env, S> {
    fn add_constraint(
        &mut self,
        indices: &[usize],
        values: &[f64],
        sense: Sense,
        rhs: f64,
    ) -> Result<(), EngineError> {
        self.outcome = None;
        self.data.add_row(indices, values, sense, rhs)
    }

    fn add_quadratic_terms(
        &mut self,
        rows: &[usize],
        cols: &[usize],
        values: &[f64],
    ) -> Result<(), EngineError> {
        self.outcome = None;
        self.data.add_terms(rows, cols, values)
    }

    fn set_int_param(&mut self, name: &str, value: i32) -> Result<(), EngineError> {
        let param = lookup_int_param(name, value)?;
        self.data.params.insert(param.name, value);
        Ok(())
    }

    fn optimize(&mut self) -> Result<(), EngineError> {
        let console = self.data.log_to_console();
        let log = &self.env.log;
        log.line(
            console,
            &format!(
                "{}: optimize model '{}' with {} rows, {} columns and {} nonzeros",
                S::NAME,
                self.data.name,
                self.data.num_rows(),
                self.data.cols(),
                self.data.rows.as_matrix().nnz()
            ),
        );
        let start = Instant::now();
        let outcome = self.env.solver.solve(&self.data, log)?;
        log.line(
            console,
            &format!(
                "Finished with status {:?} in {:.3}s",
                outcome.status,
                start.elapsed().as_secs_f64()
            ),
        );
        if outcome.status.is_optimal() {
            log.line(console, &format!("Optimal objective {:.9e}", outcome.objective));
        }
        self.outcome = Some(outcome);
        Ok(())
    }

    fn status(&self) -> Result<Status, EngineError> {
        Ok(self
            .outcome
            .as_ref()
            .map_or(Status::Loaded, |outcome| outcome.status))
    }

    fn objective_value(&self) -> Result<f64, EngineError> {
        Ok(self.solved()?.objective)
    }

    fn solution(&self, out: &mut [f64]) -> Result<(), EngineError> {
        let outcome = self.solved()?;
        if out.len() != outcome.x.len() {
            return Err(EngineError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "solution buffer has {} slots for {} variables",
                    out.len(),
                    outcome.x.len()
                ),
            ));
        }
        out.copy_from_slice(&outcome.x);
        Ok(())
    }
}

/// Implement [SolverEngine] for a [BatchSolver] that is also [Clone]
macro_rules! batch_engine {
    ($solver:ty) => {
        impl $crate::solvers::SolverEngine for $solver {
            type Environment = $crate::solvers::batch::BatchEnvironment<$solver>;

            fn name(&self) -> &'static str {
                <$solver as $crate::solvers::batch::BatchSolver>::NAME
            }

            fn open_environment(
                &self,
                log_file: Option<&std::path::Path>,
            ) -> Result<Self::Environment, $crate::solvers::EngineError> {
                $crate::solvers::batch::BatchEnvironment::open(self.clone(), log_file)
            }
        }
    };
}
pub(crate) use batch_engine;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::SolverEngine;

    /// Returns the lower bounds as the solution
    #[derive(Clone)]
    struct AtLowerBound;

    impl BatchSolver for AtLowerBound {
        const NAME: &'static str = "lower";

        fn solve(&self, model: &ModelData, _log: &SolverLog) -> Result<Outcome, EngineError> {
            Ok(Outcome {
                status: Status::Optimal,
                objective: model.evaluate(&model.lower),
                x: model.lower.clone(),
            })
        }
    }

    batch_engine!(AtLowerBound);

    fn spec<'a>(c: &'a [f64], lb: &'a [f64], types: &'a [VarType]) -> ModelSpec<'a> {
        ModelSpec {
            name: "test",
            objective: c,
            lower: lb,
            upper: lb,
            var_types: types,
        }
    }

    #[test]
    fn solution_is_unavailable_before_optimize() {
        let env = AtLowerBound.open_environment(None).unwrap();
        let types = [VarType::Continuous; 2];
        let model = env.new_model(spec(&[1., 2.], &[3., 4.], &types)).unwrap();
        assert_eq!(model.status(), Ok(Status::Loaded));
        assert_eq!(
            model.objective_value().unwrap_err().kind,
            ErrorKind::DataNotAvailable
        );
    }

    #[test]
    fn optimize_then_read() {
        let env = AtLowerBound.open_environment(None).unwrap();
        let types = [VarType::Continuous; 2];
        let mut model = env.new_model(spec(&[1., 2.], &[3., 4.], &types)).unwrap();
        model.set_int_param("logtoconsole", 0).unwrap();
        model.add_quadratic_terms(&[0, 1], &[1, 0], &[1., 1.]).unwrap();
        model.optimize().unwrap();
        assert_eq!(model.status(), Ok(Status::Optimal));
        // 1*3 + 2*4 + 3*4 + 4*3
        assert_eq!(model.objective_value(), Ok(35.));
        let mut x = [0.; 2];
        model.solution(&mut x).unwrap();
        assert_eq!(x, [3., 4.]);
        let mut too_short = [0.; 1];
        assert!(model.solution(&mut too_short).is_err());
    }

    #[test]
    fn rejects_out_of_range_column() {
        let env = AtLowerBound.open_environment(None).unwrap();
        let types = [VarType::Continuous];
        let mut model = env.new_model(spec(&[1.], &[0.], &types)).unwrap();
        let err = model
            .add_constraint(&[0, 1], &[1., 1.], Sense::LessEqual, 1.)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexOutOfRange);
        assert_eq!(model.data().num_rows(), 0);
    }

    #[test]
    fn batched_rows_are_split() {
        let env = AtLowerBound.open_environment(None).unwrap();
        let types = [VarType::Continuous; 2];
        let mut model = env.new_model(spec(&[1., 1.], &[0., 0.], &types)).unwrap();
        let matrix = CsrBuffer::from_dense(&[1., 0., 0., 0., 2., 3.], 2);
        model
            .add_constraints(
                matrix.as_matrix(),
                &[Sense::Equal, Sense::LessEqual, Sense::LessEqual],
                &[1., 2., 3.],
            )
            .unwrap();
        let rows: Vec<_> = model.data().iter_rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], (&[0][..], &[1.][..], Sense::Equal, 1.));
        assert_eq!(rows[1], (&[][..], &[][..], Sense::LessEqual, 2.));
        assert_eq!(rows[2], (&[0, 1][..], &[2., 3.][..], Sense::LessEqual, 3.));
    }
}
