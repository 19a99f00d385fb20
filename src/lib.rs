//! Solve linear, quadratic and mixed integer problems given as plain arrays, by driving a
//! solver engine through its environment and model API.
//!
//! Problems are minimized. Constraint rows are either all given as a dense row-major
//! matrix or as a CSR matrix. The first `n_eq` rows are equalities, the others are `<=`
//! inequalities.
//!
//! ```rust
//! # #[cfg(feature = "microlp")] {
//! use stdlp::solvers::microlp::MicroLp;
//! use stdlp::{SolverConfig, StandardForm};
//!
//! // minimize x + y subject to x + y >= 2, x - y = 1
//! let solution = StandardForm::linear(vec![1., 1.])
//!     .leq(vec![-1., -1.], -2.)
//!     .eq(vec![1., -1.], 1.)
//!     .solve(&MicroLp, &SolverConfig::quiet())?;
//!
//! println!("x={}   y={}", solution.value(0), solution.value(1));
//! assert!((solution.objective() - 2.).abs() < 1e-9);
//! # }
//! # use stdlp::ResolutionError;
//! # Ok::<_, ResolutionError>(())
//! ```

pub use config::SolverConfig;
pub use csr::{CsrBuffer, CsrMatrix};
pub use driver::{dense_solve, dense_solve_into, sparse_solve, sparse_solve_into};
pub use error::{InputError, ResolutionError, SolveError};
pub use extract::Solution;
pub use problem::{Columns, DenseProblem, Sense, SparseProblem, VarType};
pub use solvers::{EngineError, ErrorKind, Status};
pub use standard_form::StandardForm;

pub mod config;
mod csr;
mod driver;
pub mod encoder;
mod error;
pub mod extract;
mod problem;
pub mod solvers;
mod standard_form;
