//! Error handling for the indexer.
//!
//! Every fallible operation inside a job returns [`Result`]. Errors that reach
//! the job boundary mark the job as failed; row-level problems never become an
//! [`IndexerError`] and are reported through [`crate::assemble::SkipRow`]
//! instead.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

use crate::model::{Stage, TermKey};

/// Specialized error type for indexing jobs
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error processing Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error reading Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error converting between record batches and row structs
    #[error("Row conversion error: {0}")]
    Conversion(#[from] serde_arrow::Error),

    /// Error serializing documents or reading configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fact table has an unexpected shape
    #[error("Schema error in table {table}: {message}")]
    Schema { table: String, message: String },

    /// A required fact table is not available from the source
    #[error("Fact table not available: {0}")]
    MissingTable(String),

    /// A term key has no entry in the closure index
    #[error("Unknown term: {0}")]
    UnknownTerm(TermKey),

    /// A stage projection lies outside the stage-agnostic term's valid range
    #[error("Stage {stage} of {emaps} is outside the valid range {start}..={end} of {emapa}")]
    StageOutOfRange {
        emaps: TermKey,
        emapa: TermKey,
        stage: Stage,
        start: Stage,
        end: Stage,
    },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// The output sink rejected an operation
    #[error("Sink error: {0}")]
    Sink(String),

    /// A job name was not recognised
    #[error("Unknown job: {0}")]
    UnknownJob(String),

    /// A job stopped without producing a result
    #[error("Job {name} failed: {message}")]
    Job { name: String, message: String },
}

impl IndexerError {
    /// Build a schema error for the given table
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// Result type for indexer operations
pub type Result<T> = std::result::Result<T, IndexerError>;
