//! Solver parameters passed through to the engine on every solve.
use std::path::{Path, PathBuf};

use crate::solvers::{EngineError, ErrorKind};

/// Log file used by the engine environment unless configured otherwise
pub const DEFAULT_LOG_FILE: &str = "dense.log";

/// Name of the algorithm selection parameter
pub const METHOD: &str = "Method";
/// Name of the console logging parameter
pub const LOG_TO_CONSOLE: &str = "LogToConsole";
/// Name of the crossover parameter
pub const CROSSOVER: &str = "Crossover";

/// An integer parameter known to the engines: its canonical name, its range and its default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntParam {
    /// Canonical spelling
    pub name: &'static str,
    /// Smallest accepted value
    pub min: i32,
    /// Largest accepted value
    pub max: i32,
    /// Value used when the parameter is never set
    pub default: i32,
}

/// Every integer parameter an engine model accepts
pub const INT_PARAMS: &[IntParam] = &[
    IntParam {
        name: METHOD,
        min: -1,
        max: 5,
        default: -1,
    },
    IntParam {
        name: LOG_TO_CONSOLE,
        min: 0,
        max: 1,
        default: 1,
    },
    IntParam {
        name: CROSSOVER,
        min: -1,
        max: 4,
        default: -1,
    },
];

/// Find a parameter by name, ignoring case, and check that `value` is in its range
pub fn lookup_int_param(name: &str, value: i32) -> Result<&'static IntParam, EngineError> {
    let param = INT_PARAMS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            EngineError::new(
                ErrorKind::UnknownParameter,
                format!("unknown parameter '{}'", name),
            )
        })?;
    if value < param.min || value > param.max {
        return Err(EngineError::new(
            ErrorKind::ValueOutOfRange,
            format!(
                "value {} for parameter {} is outside of [{}, {}]",
                value, param.name, param.min, param.max
            ),
        ));
    }
    Ok(param)
}

/// The configuration of a solve call.
///
/// ```
/// use stdlp::SolverConfig;
/// let config = SolverConfig::default().method(2).crossover(0).log_to_console(false);
/// assert_eq!(config.int_params(), [("Method", 2), ("LogToConsole", 0), ("Crossover", 0)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    method: i32,
    log_to_console: bool,
    crossover: i32,
    log_file: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            method: -1,
            log_to_console: true,
            crossover: -1,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

impl SolverConfig {
    /// No console output and no log file
    pub fn quiet() -> Self {
        SolverConfig::default()
            .log_to_console(false)
            .without_log_file()
    }

    /// Algorithm selection. -1 lets the engine choose; the other values are engine specific
    pub fn method(mut self, method: i32) -> Self {
        self.method = method;
        self
    }

    /// Whether the engine should echo its log to standard output
    pub fn log_to_console(mut self, log_to_console: bool) -> Self {
        self.log_to_console = log_to_console;
        self
    }

    /// Crossover strategy after an interior point solve. -1 lets the engine choose, 0 disables it
    pub fn crossover(mut self, crossover: i32) -> Self {
        self.crossover = crossover;
        self
    }

    /// The file the engine environment writes its log to
    pub fn log_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Do not write a log file
    pub fn without_log_file(mut self) -> Self {
        self.log_file = None;
        self
    }

    /// The log file, if any
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// The parameters set on each model, in the order they are set
    pub fn int_params(&self) -> [(&'static str, i32); 3] {
        [
            (METHOD, self.method),
            (LOG_TO_CONSOLE, self.log_to_console as i32),
            (CROSSOVER, self.crossover),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_names_ignore_case() {
        assert_eq!(lookup_int_param("method", 2).unwrap().name, METHOD);
        assert_eq!(lookup_int_param("LOGTOCONSOLE", 0).unwrap().name, LOG_TO_CONSOLE);
    }

    #[test]
    fn unknown_parameter() {
        let err = lookup_int_param("Methd", 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownParameter);
    }

    #[test]
    fn out_of_range_value() {
        let err = lookup_int_param(CROSSOVER, 9).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueOutOfRange);
    }

    #[test]
    fn quiet_has_no_log_file() {
        let config = SolverConfig::quiet();
        assert_eq!(config.log_path(), None);
        assert_eq!(config.int_params()[1], (LOG_TO_CONSOLE, 0));
        assert_eq!(
            SolverConfig::default().log_path(),
            Some(Path::new(DEFAULT_LOG_FILE))
        );
    }
}
