//! The solve entry points: encode, drive one engine session, extract the result.
//!
//! Each call opens its own environment and model and drops both before returning,
//! whether it succeeds or not. Nothing is kept between calls.
use crate::config::SolverConfig;
use crate::encoder::{self, QuadraticTerms};
use crate::error::{ResolutionError, SolveError};
use crate::extract::{self, Solution};
use crate::problem::{check_len, Columns, DenseProblem, Sense, SparseProblem};
use crate::solvers::{EngineError, Environment, ModelHandle, ModelSpec, SolverEngine, Status};

/// One pass through an engine: environment, model, parameters, optimization, extraction
struct Session<'a, E> {
    engine: &'a E,
    config: &'a SolverConfig,
    name: &'static str,
    rows: usize,
    cols: usize,
    columns: Columns<'a>,
}

impl<'a, E: SolverEngine> Session<'a, E> {
    fn run<L>(self, load: L, solution: &mut [f64], objective: &mut f64) -> Result<Status, SolveError>
    where
        L: FnOnce(&mut dyn ModelHandle, &[Sense]) -> Result<(), EngineError>,
    {
        check_len("solution buffer", self.cols, solution.len())?;
        let senses = encoder::constraint_senses(self.rows, self.columns.n_eq);
        let var_types = encoder::variable_types(self.cols, self.columns.var_types);
        log::debug!(
            "{} {} problem: {} rows ({} equalities), {} columns",
            self.engine.name(),
            self.name,
            self.rows,
            self.columns.n_eq,
            self.cols
        );

        let env = self.engine.open_environment(self.config.log_path())?;
        let mut model = env.new_model(ModelSpec {
            name: self.name,
            objective: self.columns.objective,
            lower: self.columns.lower,
            upper: self.columns.upper,
            var_types: &var_types,
        })?;
        load(&mut model, &senses)?;
        for (name, value) in self.config.int_params() {
            log::debug!("setting {} = {}", name, value);
            model.set_int_param(name, value)?;
        }

        model.optimize()?;
        let status = model.status()?;
        log::debug!("{} finished with status {:?}", self.engine.name(), status);
        if status.is_optimal() {
            extract::extract_into(&model, solution, objective)?;
        }
        Ok(status)
    }
}

/// Solve a problem with a dense constraint matrix, writing the result in the caller's buffers.
///
/// `solution` must have one slot per variable. `solution` and `objective` are written only
/// when the returned status is [Status::Optimal]; otherwise they keep the values they had.
/// Statuses other than optimal are not errors.
pub fn dense_solve_into<E: SolverEngine>(
    engine: &E,
    problem: &DenseProblem<'_>,
    config: &SolverConfig,
    solution: &mut [f64],
    objective: &mut f64,
) -> Result<Status, SolveError> {
    problem.validate()?;
    let session = Session {
        engine,
        config,
        name: "dense",
        rows: problem.rows,
        cols: problem.cols,
        columns: problem.columns,
    };
    session.run(
        |model, senses| {
            encoder::add_dense_rows(
                model,
                problem.matrix,
                problem.cols,
                senses,
                problem.columns.rhs,
            )?;
            if let Some(q) = problem.quadratic {
                let terms = QuadraticTerms::from_dense(q, problem.cols);
                log::debug!("{} quadratic terms", terms.len());
                terms.add_to(model)?;
            }
            Ok(())
        },
        solution,
        objective,
    )
}

/// Solve a problem with a CSR constraint matrix, writing the result in the caller's buffers.
///
/// The CSR arrays are handed to the engine in a single call. Buffers are written only when
/// the returned status is [Status::Optimal].
pub fn sparse_solve_into<E: SolverEngine>(
    engine: &E,
    problem: &SparseProblem<'_>,
    config: &SolverConfig,
    solution: &mut [f64],
    objective: &mut f64,
) -> Result<Status, SolveError> {
    problem.validate()?;
    let session = Session {
        engine,
        config,
        name: "sparse",
        rows: problem.rows,
        cols: problem.cols,
        columns: problem.columns,
    };
    session.run(
        |model, senses| {
            log::debug!("{} nonzeros", problem.matrix.nnz());
            encoder::add_sparse_rows(model, problem.matrix, senses, problem.columns.rhs)
        },
        solution,
        objective,
    )
}

fn into_solution(status: Status, objective: f64, values: Vec<f64>) -> Result<Solution, ResolutionError> {
    if status.is_optimal() {
        Ok(Solution::new(objective, values))
    } else {
        Err(ResolutionError::from_status(status))
    }
}

/// Solve a problem with a dense constraint matrix.
///
/// ```
/// # #[cfg(feature = "clarabel")] {
/// use stdlp::{dense_solve, solvers::clarabel::Clarabel, Columns, DenseProblem, SolverConfig};
/// // minimize x subject to x >= 2, written -x <= -2, with 0 <= x <= 10
/// let problem = DenseProblem {
///     rows: 1,
///     cols: 1,
///     quadratic: None,
///     matrix: &[-1.],
///     columns: Columns {
///         objective: &[1.],
///         rhs: &[-2.],
///         lower: &[0.],
///         upper: &[10.],
///         var_types: None,
///         n_eq: 0,
///     },
/// };
/// let solution = dense_solve(&Clarabel::default(), &problem, &SolverConfig::quiet()).unwrap();
/// assert!((solution.objective() - 2.).abs() < 1e-6);
/// # }
/// ```
pub fn dense_solve<E: SolverEngine>(
    engine: &E,
    problem: &DenseProblem<'_>,
    config: &SolverConfig,
) -> Result<Solution, ResolutionError> {
    let mut values = vec![0.; problem.cols];
    let mut objective = 0.;
    let status = dense_solve_into(engine, problem, config, &mut values, &mut objective)?;
    into_solution(status, objective, values)
}

/// Solve a problem with a CSR constraint matrix
pub fn sparse_solve<E: SolverEngine>(
    engine: &E,
    problem: &SparseProblem<'_>,
    config: &SolverConfig,
) -> Result<Solution, ResolutionError> {
    let mut values = vec![0.; problem.cols];
    let mut objective = 0.;
    let status = sparse_solve_into(engine, problem, config, &mut values, &mut objective)?;
    into_solution(status, objective, values)
}
