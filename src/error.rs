use thiserror::Error;

/// Malformed process descriptor. Raised before any tick executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("workload contains no processes")]
    EmptyWorkload,

    #[error("process #{index}: id must not be empty")]
    EmptyId { index: usize },

    #[error("process {id}: id is used more than once")]
    DuplicateId { id: String },

    #[error("process {id}: cpu_bursts must not be empty")]
    EmptyBursts { id: String },

    #[error("process {id}: cpu_bursts[{index}] = {value} must be positive")]
    NonPositiveBurst { id: String, index: usize, value: i64 },

    #[error("process {id}: io_times[{index}] = {value} must be positive")]
    NonPositiveIo { id: String, index: usize, value: i64 },

    #[error("process {id}: io_times has {actual} entries, expected {expected} (one per gap between bursts)")]
    IoLengthMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("process {id}: arrival_time = {value} must not be negative")]
    NegativeArrival { id: String, value: i64 },
}

/// Invalid run configuration. Raised before any tick executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown scheduling policy '{0}'; expected one of FIFO, SJF, STCF, RR")]
    UnknownPolicy(String),

    #[error("round-robin requires a quantum")]
    MissingQuantum,

    #[error("quantum must be positive, got {0}")]
    InvalidQuantum(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
