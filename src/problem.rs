//! The caller-owned description of a problem, borrowed for the duration of one solve.
use crate::csr::CsrMatrix;
use crate::error::InputError;

/// The type of a variable, as understood by the solver engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VarType {
    /// Any real value between the bounds
    #[default]
    Continuous,
    /// 0 or 1
    Binary,
    /// Any whole number between the bounds
    Integer,
    /// 0, or any real value between the bounds
    SemiContinuous,
    /// 0, or any whole number between the bounds
    SemiInteger,
}

impl VarType {
    /// Translate a numeric type code: 0 continuous, 1 binary, 2 integer,
    /// 3 semi-continuous, 4 semi-integer.
    ///
    /// Codes outside of `0..=4` are read as [VarType::Continuous] instead of being rejected.
    pub fn from_code(code: i32) -> VarType {
        match code {
            1 => VarType::Binary,
            2 => VarType::Integer,
            3 => VarType::SemiContinuous,
            4 => VarType::SemiInteger,
            _ => VarType::Continuous,
        }
    }

    /// The numeric code of this type, the inverse of [VarType::from_code]
    pub fn code(self) -> i32 {
        match self {
            VarType::Continuous => 0,
            VarType::Binary => 1,
            VarType::Integer => 2,
            VarType::SemiContinuous => 3,
            VarType::SemiInteger => 4,
        }
    }

    /// Whether the variable can only take whole values
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            VarType::Binary | VarType::Integer | VarType::SemiInteger
        )
    }
}

/// The sense of a constraint row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// `a·x = rhs`
    Equal,
    /// `a·x <= rhs`
    LessEqual,
}

/// The parts shared by dense and sparse problems: everything except the constraint matrix.
#[derive(Debug, Clone, Copy)]
pub struct Columns<'a> {
    /// Linear objective coefficients, one per variable
    pub objective: &'a [f64],
    /// Right hand side, one per constraint row
    pub rhs: &'a [f64],
    /// Lower bounds, one per variable
    pub lower: &'a [f64],
    /// Upper bounds, one per variable
    pub upper: &'a [f64],
    /// Optional numeric type codes, see [VarType::from_code]
    pub var_types: Option<&'a [i32]>,
    /// Rows with an index below this count are equalities, the others are `<=` inequalities
    pub n_eq: usize,
}

impl<'a> Columns<'a> {
    fn validate(&self, rows: usize, cols: usize) -> Result<(), InputError> {
        if cols == 0 {
            return Err(InputError::NoVariables);
        }
        check_len("objective", cols, self.objective.len())?;
        check_len("right hand side", rows, self.rhs.len())?;
        check_len("lower bounds", cols, self.lower.len())?;
        check_len("upper bounds", cols, self.upper.len())?;
        if let Some(codes) = self.var_types {
            check_len("variable types", cols, codes.len())?;
        }
        if self.n_eq > rows {
            return Err(InputError::TooManyEqualities {
                n_eq: self.n_eq,
                rows,
            });
        }
        Ok(())
    }
}

/// A problem whose constraint matrix (and optional quadratic objective) is dense and row-major
#[derive(Debug, Clone, Copy)]
pub struct DenseProblem<'a> {
    /// Number of constraint rows
    pub rows: usize,
    /// Number of variables
    pub cols: usize,
    /// Optional `cols × cols` quadratic objective. Every entry counts:
    /// the objective contains `q[i][j] * x_i * x_j` for all `i`, `j`.
    pub quadratic: Option<&'a [f64]>,
    /// `rows × cols` constraint matrix
    pub matrix: &'a [f64],
    /// Objective, right hand side, bounds and types
    pub columns: Columns<'a>,
}

impl<'a> DenseProblem<'a> {
    /// Check that every slice has the length implied by `rows` and `cols`
    pub fn validate(&self) -> Result<(), InputError> {
        let matrix_len = area(self.rows, self.cols)?;
        self.columns.validate(self.rows, self.cols)?;
        check_len("constraint matrix", matrix_len, self.matrix.len())?;
        if let Some(q) = self.quadratic {
            check_len("quadratic objective", area(self.cols, self.cols)?, q.len())?;
        }
        Ok(())
    }
}

/// A linear problem whose constraint matrix is in compressed sparse row form
#[derive(Debug, Clone, Copy)]
pub struct SparseProblem<'a> {
    /// Number of constraint rows
    pub rows: usize,
    /// Number of variables
    pub cols: usize,
    /// The constraint matrix
    pub matrix: CsrMatrix<'a>,
    /// Objective, right hand side, bounds and types
    pub columns: Columns<'a>,
}

impl<'a> SparseProblem<'a> {
    /// Check the lengths of every slice, the row offsets and the column indices
    pub fn validate(&self) -> Result<(), InputError> {
        self.columns.validate(self.rows, self.cols)?;
        self.matrix.validate(self.rows, self.cols)
    }
}

fn area(rows: usize, cols: usize) -> Result<usize, InputError> {
    rows.checked_mul(cols).ok_or(InputError::TooLarge { rows, cols })
}

pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), InputError> {
    if expected == found {
        Ok(())
    } else {
        Err(InputError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}
