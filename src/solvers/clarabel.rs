//! An engine that uses [clarabel](https://oxfordcontrol.github.io/ClarabelDocs/stable/),
//! a pure rust interior point solver for linear and convex quadratic problems.
use std::collections::BTreeMap;

use clarabel::algebra::CscMatrix;
use clarabel::solver::implementations::default::DefaultSettingsBuilder;
use clarabel::solver::SupportedConeT::{self, *};
use clarabel::solver::{DefaultSolver, IPSolver, SolverStatus};

use crate::config::METHOD;
use crate::problem::{Sense, VarType};
use crate::solvers::batch::{batch_engine, BatchSolver, ModelData, Outcome, SolverLog};
use crate::solvers::{EngineError, ErrorKind, Status};

/// The [clarabel](https://oxfordcontrol.github.io/ClarabelDocs/stable/) engine.
///
/// Variable bounds become constraint rows. Only continuous variables are supported,
/// and the quadratic objective must be convex. `Method` and `Crossover` are accepted but
/// have no effect: clarabel always runs its interior point method.
#[derive(Debug, Clone)]
pub struct Clarabel {
    tol_feas: f64,
}

impl Default for Clarabel {
    fn default() -> Self {
        Clarabel { tol_feas: 1e-9 }
    }
}

impl Clarabel {
    /// Set the feasibility tolerance
    pub fn with_tol_feas(mut self, tol_feas: f64) -> Self {
        self.tol_feas = tol_feas;
        self
    }
}

batch_engine!(Clarabel);

impl BatchSolver for Clarabel {
    const NAME: &'static str = "clarabel";

    fn solve(&self, model: &ModelData, log: &SolverLog) -> Result<Outcome, EngineError> {
        if let Some(j) = model.var_types.iter().position(|&t| t != VarType::Continuous) {
            return Err(EngineError::new(
                ErrorKind::NotSupported,
                format!(
                    "clarabel doesn't support {:?} variables (variable {})",
                    model.var_types[j], j
                ),
            ));
        }
        let console = model.log_to_console();
        if model.param(METHOD) == 0 || model.param(METHOD) == 1 {
            log.line(console, "clarabel has no simplex method, using interior point");
        }

        let n = model.cols();
        let mut constraints = CscMatrixBuilder::new(n);
        let mut constraint_values = Vec::new();
        let mut cones = Vec::new();
        for (indices, values, sense, rhs) in model.iter_rows() {
            constraints.add_row(indices.iter().copied().zip(values.iter().copied()));
            constraint_values.push(rhs);
            push_cone(
                &mut cones,
                match sense {
                    Sense::Equal => ZeroConeT(1),
                    Sense::LessEqual => NonnegativeConeT(1),
                },
            );
        }
        // bounds: x_j <= max and -x_j <= -min
        for j in 0..n {
            if model.upper[j] != f64::INFINITY {
                constraints.add_row(std::iter::once((j, 1.)));
                constraint_values.push(model.upper[j]);
                push_cone(&mut cones, NonnegativeConeT(1));
            }
            if model.lower[j] != f64::NEG_INFINITY {
                constraints.add_row(std::iter::once((j, -1.)));
                constraint_values.push(-model.lower[j]);
                push_cone(&mut cones, NonnegativeConeT(1));
            }
        }

        let settings = DefaultSettingsBuilder::<f64>::default()
            .verbose(console)
            .tol_feas(self.tol_feas)
            .build()
            .map_err(|e| EngineError::new(ErrorKind::InvalidArgument, format!("{:?}", e)))?;
        let mut solver = DefaultSolver::new(
            &quadratic_objective(n, &model.quadratic),
            &model.objective,
            &constraints.build(),
            &constraint_values,
            &cones,
            settings,
        )
        .map_err(|e| EngineError::new(ErrorKind::InvalidArgument, format!("{:?}", e)))?;
        solver.solve();

        let solution = &solver.solution;
        let status = match solution.status {
            SolverStatus::Solved => Status::Optimal,
            SolverStatus::AlmostSolved => Status::Suboptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                Status::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                Status::Unbounded
            }
            SolverStatus::Unsolved => Status::Loaded,
            SolverStatus::MaxIterations => Status::IterationLimit,
            SolverStatus::MaxTime => Status::TimeLimit,
            SolverStatus::NumericalError | SolverStatus::InsufficientProgress => Status::Numeric,
            SolverStatus::CallbackTerminated => Status::Interrupted,
        };
        Ok(match status {
            Status::Optimal | Status::Suboptimal => Outcome {
                status,
                objective: solution.obj_val,
                x: solution.x.clone(),
            },
            other => Outcome::without_solution(other),
        })
    }
}

/// Cones indicate the type of constraint. Consecutive cones of the same type are merged.
fn push_cone(cones: &mut Vec<SupportedConeT<f64>>, next_cone: SupportedConeT<f64>) {
    match (cones.last_mut(), next_cone) {
        (Some(ZeroConeT(a)), ZeroConeT(b)) => *a += b,
        (Some(NonnegativeConeT(a)), NonnegativeConeT(b)) => *a += b,
        (_, next_cone) => cones.push(next_cone),
    }
}

/// Clarabel minimizes `1/2 x'Px + q'x` with `P` upper triangular.
/// A term `q * x_i * x_j` adds `q` to `P[min(i,j)][max(i,j)]`, or `2q` to `P[i][i]`.
fn quadratic_objective(n: usize, terms: &[(usize, usize, f64)]) -> CscMatrix<f64> {
    // keyed by (column, row) so that iteration follows the CSC layout
    let mut entries: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for &(i, j, q) in terms {
        let (row, col) = if i <= j { (i, j) } else { (j, i) };
        let value = if i == j { 2. * q } else { q };
        *entries.entry((col, row)).or_insert(0.) += value;
    }
    let mut colptr = vec![0; n + 1];
    let mut rowval = Vec::with_capacity(entries.len());
    let mut nzval = Vec::with_capacity(entries.len());
    for (&(col, row), &value) in &entries {
        colptr[col + 1] += 1;
        rowval.push(row);
        nzval.push(value);
    }
    for col in 0..n {
        colptr[col + 1] += colptr[col];
    }
    CscMatrix::new(n, n, colptr, rowval, nzval)
}

struct CscMatrixBuilder {
    /// Indicates the row index of the corresponding element in `nzval`
    rowval: Vec<Vec<usize>>,
    /// All non-zero values in the matrix, in column-major order
    nzval: Vec<Vec<f64>>,
    n_rows: usize,
    n_cols: usize,
}

impl CscMatrixBuilder {
    fn new(n_cols: usize) -> Self {
        Self {
            rowval: vec![Vec::new(); n_cols],
            nzval: vec![Vec::new(); n_cols],
            n_rows: 0,
            n_cols,
        }
    }

    /// Repeated columns in a row are summed
    fn add_row<I: IntoIterator<Item = (usize, f64)>>(&mut self, row: I) {
        for (col, value) in row {
            let rows = &mut self.rowval[col];
            let values = &mut self.nzval[col];
            if rows.last() == Some(&self.n_rows) {
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
            } else {
                rows.push(self.n_rows);
                values.push(value);
            }
        }
        self.n_rows += 1;
    }

    fn build(self) -> CscMatrix<f64> {
        let mut colptr = Vec::with_capacity(self.n_cols + 1);
        let mut total = 0;
        colptr.push(total);
        for col in &self.rowval {
            total += col.len();
            colptr.push(total);
        }
        CscMatrix::new(
            self.n_rows,
            self.n_cols,
            colptr,
            fast_flatten_vecs(self.rowval),
            fast_flatten_vecs(self.nzval),
        )
    }
}

fn fast_flatten_vecs<T: Copy>(vecs: Vec<Vec<T>>) -> Vec<T> {
    // This is faster than vecs.into_iter().flatten().collect()
    // because it doesn't need to allocate a new Vec
    // (we take ownership of the first Vec and add the rest to it)
    let size: usize = vecs.iter().map(|v| v.len()).sum();
    let mut iter = vecs.into_iter();
    let mut result = if let Some(v) = iter.next() {
        v
    } else {
        return Vec::new();
    };
    result.reserve_exact(size - result.len());
    for v in iter {
        result.extend_from_slice(&v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::{Environment, ModelHandle, ModelSpec, SolverEngine};
    use float_eq::assert_float_eq;

    #[test]
    fn test_csc_matrix_builder() {
        let mut builder = CscMatrixBuilder::new(3);
        builder.add_row(vec![(1, 1.), (2, 2.)]);
        builder.add_row(vec![(0, 3.), (1, 4.), (2, 2.), (2, 3.)]);
        let matrix = builder.build();
        /* The matrix is:
        [ 0 1 2 ]
        [ 3 4 5 ]
        */
        assert_eq!(matrix.m, 2);
        assert_eq!(matrix.n, 3);
        assert_eq!(matrix.get_entry((0, 0)), None);
        assert_eq!(matrix.get_entry((0, 1)), Some(1.));
        assert_eq!(matrix.get_entry((0, 2)), Some(2.));
        assert_eq!(matrix.get_entry((1, 0)), Some(3.));
        assert_eq!(matrix.get_entry((1, 1)), Some(4.));
        assert_eq!(matrix.get_entry((1, 2)), Some(5.));
    }

    #[test]
    fn quadratic_objective_is_upper_triangular() {
        // x0^2 + 2 x0 x1 + 3 x1 x0
        let p = quadratic_objective(2, &[(0, 0, 1.), (0, 1, 2.), (1, 0, 3.)]);
        assert_eq!(p.get_entry((0, 0)), Some(2.));
        assert_eq!(p.get_entry((0, 1)), Some(5.));
        assert_eq!(p.get_entry((1, 0)), None);
        assert_eq!(p.get_entry((1, 1)), None);
    }

    #[test]
    fn can_solve_with_inequality() {
        // maximise x + y as minimise -x - y, 0 <= x <= 2, 1 <= y <= 3, 2x + y <= 4
        let env = Clarabel::default().open_environment(None).unwrap();
        let types = [VarType::Continuous; 2];
        let mut model = env
            .new_model(ModelSpec {
                name: "test",
                objective: &[-1., -1.],
                lower: &[0., 1.],
                upper: &[2., 3.],
                var_types: &types,
            })
            .unwrap();
        model.set_int_param("LogToConsole", 0).unwrap();
        model
            .add_constraint(&[0, 1], &[2., 1.], Sense::LessEqual, 4.)
            .unwrap();
        model.optimize().unwrap();
        assert_eq!(model.status(), Ok(Status::Optimal));
        let mut x = [0.; 2];
        model.solution(&mut x).unwrap();
        assert_float_eq!(x[0], 0.5, abs <= 1e-5);
        assert_float_eq!(x[1], 3., abs <= 1e-5);
        assert_float_eq!(model.objective_value().unwrap(), -3.5, abs <= 1e-5);
    }

    #[test]
    fn rejects_integer_variables() {
        let env = Clarabel::default().open_environment(None).unwrap();
        let types = [VarType::Integer];
        let mut model = env
            .new_model(ModelSpec {
                name: "test",
                objective: &[1.],
                lower: &[0.],
                upper: &[1.],
                var_types: &types,
            })
            .unwrap();
        let err = model.optimize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotSupported);
    }
}
