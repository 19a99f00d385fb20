//! An engine that uses [microlp](https://docs.rs/microlp), a pure rust simplex solver with
//! branch and bound for integer variables.

use crate::problem::{Sense, VarType};
use crate::solvers::batch::{batch_engine, BatchSolver, ModelData, Outcome, SolverLog};
use crate::solvers::{EngineError, ErrorKind, Status};

/// The [microlp](https://docs.rs/microlp) engine.
///
/// Supports continuous, integer and binary variables. Integer bounds are rounded inwards and
/// infinite bounds become the `i32` limits. Quadratic objectives and semi-continuous
/// variables are rejected. `Method` and `Crossover` have no effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLp;

batch_engine!(MicroLp);

/// Integer bounds of a variable, `None` when no whole number fits
fn integer_bounds(min: f64, max: f64) -> Option<(i32, i32)> {
    // float to int casts saturate, infinities included
    let (min, max) = (min.ceil() as i32, max.floor() as i32);
    (min <= max).then_some((min, max))
}

impl BatchSolver for MicroLp {
    const NAME: &'static str = "microlp";

    fn solve(&self, model: &ModelData, _log: &SolverLog) -> Result<Outcome, EngineError> {
        if !model.quadratic.is_empty() {
            return Err(EngineError::new(
                ErrorKind::NotSupported,
                "microlp does not support quadratic objectives",
            ));
        }
        let mut problem = microlp::Problem::new(microlp::OptimizationDirection::Minimize);
        let mut variables = Vec::with_capacity(model.cols());
        for j in 0..model.cols() {
            let (c, min, max) = (model.objective[j], model.lower[j], model.upper[j]);
            let var = match model.var_types[j] {
                VarType::Continuous => problem.add_var(c, (min, max)),
                VarType::Binary if min <= 0. && max >= 1. => problem.add_binary_var(c),
                VarType::Binary | VarType::Integer => {
                    let (min, max) = if model.var_types[j] == VarType::Binary {
                        (min.max(0.), max.min(1.))
                    } else {
                        (min, max)
                    };
                    match integer_bounds(min, max) {
                        Some((min, max)) => problem.add_integer_var(c, (min, max)),
                        None => return Ok(Outcome::without_solution(Status::Infeasible)),
                    }
                }
                other => {
                    return Err(EngineError::new(
                        ErrorKind::NotSupported,
                        format!("microlp does not support {:?} variables", other),
                    ))
                }
            };
            variables.push(var);
        }
        for (indices, values, sense, rhs) in model.iter_rows() {
            let op = match sense {
                Sense::Equal => microlp::ComparisonOp::Eq,
                Sense::LessEqual => microlp::ComparisonOp::Le,
            };
            let mut linear_expr = microlp::LinearExpr::empty();
            for (&j, &coefficient) in indices.iter().zip(values) {
                linear_expr.add(variables[j], coefficient);
            }
            problem.add_constraint(linear_expr, op, rhs);
        }

        match problem.solve() {
            Ok(solution) => Ok(Outcome {
                status: Status::Optimal,
                objective: solution.objective(),
                x: variables.iter().map(|&v| solution[v]).collect(),
            }),
            Err(microlp::Error::Infeasible) => Ok(Outcome::without_solution(Status::Infeasible)),
            Err(microlp::Error::Unbounded) => Ok(Outcome::without_solution(Status::Unbounded)),
            Err(microlp::Error::InternalError(s)) => Err(EngineError::new(ErrorKind::Internal, s)),
        }
    }
}
