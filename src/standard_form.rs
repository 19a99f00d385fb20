//! A builder for problems written in standard form:
//! minimize `x'Qx + c'x` subject to `A_eq x = b_eq`, `A x <= b` and `lb <= x <= ub`.
//!
//! ```
//! use stdlp::solvers::recording::RecordingEngine;
//! use stdlp::{SolverConfig, StandardForm};
//!
//! let engine = RecordingEngine::new().with_solution(2., vec![2., 0.]);
//! let solution = StandardForm::linear(vec![1., 1.])
//!     .leq(vec![-1., 0.], -2.)
//!     .eq(vec![0., 1.], 0.)
//!     .bounds(vec![0., 0.], vec![10., 10.])
//!     .solve(&engine, &SolverConfig::quiet())
//!     .unwrap();
//! assert_eq!(solution.values(), &[2., 0.]);
//! ```
use crate::config::SolverConfig;
use crate::csr::CsrBuffer;
use crate::driver::{dense_solve, sparse_solve};
use crate::error::{InputError, ResolutionError};
use crate::extract::Solution;
use crate::problem::{check_len, Columns, DenseProblem, SparseProblem, VarType};
use crate::solvers::SolverEngine;

/// An owned problem in standard form, transcribed through the dense or the sparse path
#[derive(Debug, Clone, PartialEq)]
pub struct StandardForm {
    objective: Vec<f64>,
    quadratic: Option<Vec<f64>>,
    equalities: Vec<(Vec<f64>, f64)>,
    inequalities: Vec<(Vec<f64>, f64)>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    var_types: Option<Vec<VarType>>,
    sparse: bool,
}

impl StandardForm {
    /// Minimize `c'x`. Variables are continuous and non-negative until told otherwise.
    pub fn linear(objective: Vec<f64>) -> Self {
        let cols = objective.len();
        StandardForm {
            objective,
            quadratic: None,
            equalities: Vec::new(),
            inequalities: Vec::new(),
            lower: vec![0.; cols],
            upper: vec![f64::INFINITY; cols],
            var_types: None,
            sparse: false,
        }
    }

    /// Minimize `x'Qx + c'x`, with `q` a row-major `n × n` matrix.
    /// Both `q[i][j]` and `q[j][i]` contribute to the `x_i x_j` term.
    pub fn quadratic(q: Vec<f64>, objective: Vec<f64>) -> Self {
        StandardForm {
            quadratic: Some(q),
            ..StandardForm::linear(objective)
        }
    }

    /// Add the constraint `row·x <= rhs`
    pub fn leq(mut self, row: Vec<f64>, rhs: f64) -> Self {
        self.inequalities.push((row, rhs));
        self
    }

    /// Add the constraint `row·x = rhs`
    pub fn eq(mut self, row: Vec<f64>, rhs: f64) -> Self {
        self.equalities.push((row, rhs));
        self
    }

    /// Replace the variable bounds. Infinite values are allowed.
    pub fn bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Give every variable the same type
    pub fn var_type(mut self, var_type: VarType) -> Self {
        self.var_types = Some(vec![var_type; self.objective.len()]);
        self
    }

    /// Give each variable its own type
    pub fn var_types(mut self, var_types: Vec<VarType>) -> Self {
        self.var_types = Some(var_types);
        self
    }

    /// Send the constraint matrix through the sparse path.
    /// Only linear objectives can be solved that way.
    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    /// Number of variables
    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    /// Number of constraint rows, equalities included
    pub fn num_constraints(&self) -> usize {
        self.equalities.len() + self.inequalities.len()
    }

    /// Equalities first, so that they form the equality prefix
    fn rows(&self) -> impl Iterator<Item = &(Vec<f64>, f64)> + '_ {
        self.equalities.iter().chain(&self.inequalities)
    }

    /// Solve the problem with `engine`
    pub fn solve<E: SolverEngine>(
        &self,
        engine: &E,
        config: &SolverConfig,
    ) -> Result<Solution, ResolutionError> {
        let cols = self.num_variables();
        let rows = self.num_constraints();
        for (row, _) in self.rows() {
            check_len("constraint row", cols, row.len())?;
        }
        let rhs: Vec<f64> = self.rows().map(|&(_, rhs)| rhs).collect();
        let codes: Option<Vec<i32>> = self
            .var_types
            .as_ref()
            .map(|types| types.iter().map(|t| t.code()).collect());
        let columns = Columns {
            objective: &self.objective,
            rhs: &rhs,
            lower: &self.lower,
            upper: &self.upper,
            var_types: codes.as_deref(),
            n_eq: self.equalities.len(),
        };

        if self.sparse {
            if self.quadratic.is_some() {
                return Err(InputError::QuadraticWithSparse.into());
            }
            let mut matrix = CsrBuffer::new();
            for (row, _) in self.rows() {
                matrix.push_dense_row(row);
            }
            let problem = SparseProblem {
                rows,
                cols,
                matrix: matrix.as_matrix(),
                columns,
            };
            sparse_solve(engine, &problem, config)
        } else {
            let matrix: Vec<f64> = self.rows().flat_map(|(row, _)| row.iter().copied()).collect();
            let problem = DenseProblem {
                rows,
                cols,
                quadratic: self.quadratic.as_deref(),
                matrix: &matrix,
                columns,
            };
            dense_solve(engine, &problem, config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Sense;
    use crate::solvers::recording::{Call, RecordedRow, RecordingEngine};

    fn row(indices: Vec<usize>, values: Vec<f64>, sense: Sense, rhs: f64) -> RecordedRow {
        RecordedRow {
            indices,
            values,
            sense,
            rhs,
        }
    }

    #[test]
    fn equalities_come_first() {
        let engine = RecordingEngine::new().with_solution(0., vec![0., 0.]);
        StandardForm::linear(vec![1., 1.])
            .leq(vec![1., 0.], 4.)
            .eq(vec![0., 2.], 1.)
            .solve(&engine, &SolverConfig::quiet())
            .unwrap();
        assert_eq!(
            engine.constraint_rows(),
            vec![
                row(vec![1], vec![2.], Sense::Equal, 1.),
                row(vec![0], vec![1.], Sense::LessEqual, 4.),
            ]
        );
    }

    #[test]
    fn sparse_and_dense_transcribe_the_same_rows() {
        let problem = StandardForm::linear(vec![1., 0., 2.])
            .eq(vec![1., 1., 1.], 1.)
            .leq(vec![0., 0., 0.], 0.)
            .leq(vec![0., -3., 0.], 5.);
        let dense = RecordingEngine::new();
        let sparse = RecordingEngine::new();
        let config = SolverConfig::quiet();
        assert_eq!(
            problem.solve(&dense, &config),
            problem.clone().sparse().solve(&sparse, &config)
        );
        assert_eq!(dense.constraint_rows(), sparse.constraint_rows());
        assert_eq!(dense.constraint_rows().len(), 3);
        assert!(sparse
            .calls()
            .iter()
            .any(|call| matches!(call, Call::AddConstraints { .. })));
    }

    #[test]
    fn default_bounds_and_broadcast_type() {
        let engine = RecordingEngine::new();
        StandardForm::linear(vec![1., 1.])
            .var_type(VarType::Integer)
            .solve(&engine, &SolverConfig::quiet())
            .unwrap();
        let new_model = engine
            .calls()
            .into_iter()
            .find(|call| matches!(call, Call::NewModel { .. }));
        assert_eq!(
            new_model,
            Some(Call::NewModel {
                name: "dense".into(),
                objective: vec![1., 1.],
                lower: vec![0., 0.],
                upper: vec![f64::INFINITY; 2],
                var_types: vec![VarType::Integer; 2],
            })
        );
    }

    #[test]
    fn quadratic_objective_is_dense_only() {
        let engine = RecordingEngine::new();
        let err = StandardForm::quadratic(vec![1.], vec![0.])
            .sparse()
            .solve(&engine, &SolverConfig::quiet())
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::InvalidInput(InputError::QuadraticWithSparse)
        );
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn rejects_short_row() {
        let engine = RecordingEngine::new();
        let err = StandardForm::linear(vec![1., 1.])
            .leq(vec![1.], 1.)
            .solve(&engine, &SolverConfig::quiet())
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::InvalidInput(InputError::DimensionMismatch {
                what: "constraint row",
                expected: 2,
                found: 1
            })
        );
    }
}
