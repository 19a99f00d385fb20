//! Copy the result of an optimal solve out of the engine.
use crate::solvers::{EngineError, ModelHandle};

/// Read the objective value and the solution vector into the caller's buffers.
///
/// `objective` is only written once the solution vector was read successfully.
pub fn extract_into(
    model: &dyn ModelHandle,
    solution: &mut [f64],
    objective: &mut f64,
) -> Result<(), EngineError> {
    let value = model.objective_value()?;
    model.solution(solution)?;
    *objective = value;
    Ok(())
}

/// An optimal solution, owned
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    objective: f64,
    values: Vec<f64>,
}

impl Solution {
    pub(crate) fn new(objective: f64, values: Vec<f64>) -> Self {
        Solution { objective, values }
    }

    /// The optimal objective value
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// The value of variable `i`
    pub fn value(&self, i: usize) -> f64 {
        self.values[i]
    }

    /// The values of all the variables
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
