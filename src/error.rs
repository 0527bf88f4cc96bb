use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Replacement policy error: {0}")]
    PolicyError(#[from] PolicyError),

    #[error("Failed to read trace: {0}")]
    TraceError(#[from] TraceError),

    /// `entry` is the 1-based position of the offending entry: the line
    /// number for trace files, the record number for in-memory traces
    #[error("Invalid address {address} in trace at entry {entry}")]
    InvalidAddress { address: i64, entry: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to parse configuration file: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Errors raised while building a cache or a hierarchy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} of cache '{name}' must be positive")]
    NonPositive { name: String, field: &'static str },

    #[error("Block size {0} of cache '{1}' is not a power of two")]
    BlockSizeNotPow2(u64, String),

    #[error(
        "Cache size {total_size} of '{name}' is not divisible by \
         block size {block_size} x associativity {associativity}"
    )]
    Indivisible {
        name: String,
        total_size: u64,
        block_size: u64,
        associativity: u64,
    },

    #[error("Cache '{name}' needs {num_lines} lines, which cannot be allocated")]
    TooLarge { name: String, num_lines: u64 },

    #[error("A cache hierarchy needs at least one level")]
    NoLevels,
}

/// Errors related to replacement policy selection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown replacement policy '{0}', expected one of LRU, FIFO, Random, LFU")]
    UnknownPolicy(String),
}

/// Errors related to reading trace files
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace file '{0}': {1}")]
    FileReadError(PathBuf, #[source] std::io::Error),

    #[error("Invalid format at line {line}: {reason}")]
    ParseError { line: usize, reason: String },
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
