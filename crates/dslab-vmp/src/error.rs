//! Error type shared by the crate.

/// Errors that abort loading or running a scenario.
///
/// Admission failures, SLA violations and malformed requests are not errors:
/// they are accounted in the simulation context and the run goes on.
#[derive(Debug, thiserror::Error)]
pub enum VmpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value `{value}` for config key {key}")]
    Config { key: String, value: String },

    #[error("unknown placement heuristic: {0}")]
    UnknownHeuristic(String),

    #[error("unknown reconfiguration algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown scalarization method: {0}")]
    UnknownScalarization(String),

    #[error("unknown reconfiguration optimizer: {0}")]
    UnknownOptimizer(String),

    #[error("unknown recovering method: {0}")]
    UnknownRecoveringMethod(String),

    #[error("malformed trace at line {line}: {message}")]
    Trace { line: usize, message: String },

    #[error("reconfiguration failed: {0}")]
    Reconfiguration(String),
}

/// Result alias used across the crate.
pub type VmpResult<T> = Result<T, VmpError>;
