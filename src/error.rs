//! Error types for the payables engine.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during engine operation.
///
/// Unparseable cell values are not errors: they are coerced to defaults
/// during normalization.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A column needed by an active filter or aggregation rule is absent
    #[error("Missing column '{column}' in {dataset} data")]
    MissingColumn {
        dataset: &'static str,
        column: String,
    },

    /// Grouping or aggregation settings cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sum left the representable decimal range
    #[error("Amount overflow while summing {0}")]
    AmountOverflow(String),

    /// Configuration text is not valid TOML or has the wrong shape
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding or encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing input file arguments
    #[error(
        "Missing input file argument. Usage: payables-engine <invoices.csv> <balances.csv> \
         [--config <file.toml>] [--output-dir <dir>] [--prefix <prefix>]"
    )]
    MissingArgument,

    /// Unrecognised or incomplete command line option
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
