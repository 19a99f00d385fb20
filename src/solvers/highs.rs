//! An engine that uses the [HiGHS](https://highs.dev) solver, through the `highs` crate.
use highs::HighsModelStatus;

use crate::config::{CROSSOVER, METHOD};
use crate::problem::{Sense, VarType};
use crate::solvers::batch::{batch_engine, BatchSolver, ModelData, Outcome, SolverLog};
use crate::solvers::{EngineError, ErrorKind, Status};

/// The [HiGHS](https://highs.dev) engine.
///
/// Supports continuous, integer and binary variables with a linear objective.
///
/// `Method` selects the HiGHS `solver` option: `-1` lets HiGHS choose, `0` and `1` run the
/// simplex method and `2` the interior point method. `Crossover` maps to `run_crossover`.
/// The environment log file is passed on as `log_file`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Highs;

batch_engine!(Highs);

/// The value of the HiGHS `solver` option for a `Method` parameter
fn solver_option(method: i32) -> &'static str {
    match method {
        0 | 1 => "simplex",
        2 => "ipm",
        _ => "choose",
    }
}

/// The value of the HiGHS `run_crossover` option for a `Crossover` parameter
fn crossover_option(crossover: i32) -> &'static str {
    match crossover {
        0 => "off",
        c if c > 0 => "on",
        _ => "choose",
    }
}

impl BatchSolver for Highs {
    const NAME: &'static str = "highs";

    fn solve(&self, model: &ModelData, log: &SolverLog) -> Result<Outcome, EngineError> {
        if !model.quadratic.is_empty() {
            return Err(EngineError::new(
                ErrorKind::NotSupported,
                "the highs engine does not support quadratic objectives",
            ));
        }
        let mut problem = highs::RowProblem::default();
        let mut columns = Vec::with_capacity(model.cols());
        for j in 0..model.cols() {
            let (min, max) = match model.var_types[j] {
                VarType::Continuous | VarType::Integer => (model.lower[j], model.upper[j]),
                VarType::Binary => (model.lower[j].max(0.), model.upper[j].min(1.)),
                other => {
                    return Err(EngineError::new(
                        ErrorKind::NotSupported,
                        format!("highs does not support {:?} variables", other),
                    ))
                }
            };
            let is_integer = model.var_types[j].is_integer();
            columns.push(problem.add_column_with_integrality(
                model.objective[j],
                min..max,
                is_integer,
            ));
        }
        for (indices, values, sense, rhs) in model.iter_rows() {
            let factors = indices
                .iter()
                .zip(values)
                .map(|(&j, &factor)| (columns[j], factor));
            match sense {
                Sense::Equal => problem.add_row(rhs..=rhs, factors),
                Sense::LessEqual => problem.add_row(..=rhs, factors),
            }
        }

        let console = model.log_to_console();
        let mut highs_model = problem.optimise(highs::Sense::Minimise);
        highs_model.set_option("output_flag", console || log.path().is_some());
        highs_model.set_option("log_to_console", console);
        if let Some(path) = log.path() {
            highs_model.set_option("log_file", &*path.to_string_lossy());
        }
        highs_model.set_option("solver", solver_option(model.param(METHOD)));
        highs_model.set_option("run_crossover", crossover_option(model.param(CROSSOVER)));

        let solved = highs_model.solve();
        let status = match solved.status() {
            HighsModelStatus::Optimal => Status::Optimal,
            HighsModelStatus::Infeasible => Status::Infeasible,
            HighsModelStatus::Unbounded => Status::Unbounded,
            HighsModelStatus::UnboundedOrInfeasible => Status::InfOrUnbd,
            HighsModelStatus::ReachedTimeLimit => Status::TimeLimit,
            HighsModelStatus::ReachedIterationLimit => Status::IterationLimit,
            other => {
                log::warn!("highs finished with status {:?}", other);
                Status::Numeric
            }
        };
        if status != Status::Optimal {
            return Ok(Outcome::without_solution(status));
        }
        let x = solved.get_solution().columns().to_vec();
        Ok(Outcome {
            status,
            objective: solved.objective_value(),
            x,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::{Environment, ModelHandle, ModelSpec, SolverEngine};
    use float_eq::assert_float_eq;

    #[test]
    fn options() {
        assert_eq!(solver_option(-1), "choose");
        assert_eq!(solver_option(1), "simplex");
        assert_eq!(solver_option(2), "ipm");
        assert_eq!(solver_option(4), "choose");
        assert_eq!(crossover_option(-1), "choose");
        assert_eq!(crossover_option(0), "off");
        assert_eq!(crossover_option(3), "on");
    }

    #[test]
    fn can_solve_integer_problem() {
        // minimise -x - y, 2x + y <= 4, x integer in [0, 2], y in [1, 3]
        let env = Highs.open_environment(None).unwrap();
        let types = [VarType::Integer, VarType::Continuous];
        let mut model = env
            .new_model(ModelSpec {
                name: "mip",
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
        assert_float_eq!(x[0], x[0].round(), abs <= 1e-6);
        assert_float_eq!(model.objective_value().unwrap(), -3., abs <= 1e-6);
    }
}
