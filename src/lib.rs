//! Builds search-ready gene expression documents from relational facts.
//!
//! Each indexing job streams a fact table through memory-bounded key windows,
//! joins every row against window-scoped lookup caches and the anatomy
//! closure index, and writes the assembled documents to an output sink.

pub mod assemble;
pub mod cache;
pub mod config;
pub mod error;
pub mod exclusivity;
pub mod jobs;
pub mod model;
pub mod ontology;
pub mod orchestrator;
pub mod scan;
pub mod sink;
pub mod source;
pub mod utils;

// Core types
pub use config::{ChunkSizes, IndexerConfig};
pub use error::{IndexerError, Result};
pub use model::{Document, FieldValue};

// Closure index and exclusivity
pub use exclusivity::{ExclusivitySummary, MarkerExclusivity};
pub use ontology::{ClosureBuilder, TermClosureIndex};

// Pipeline
pub use scan::{ChunkStrategy, ChunkedPipeline, KeyWindow, PipelineStats, WindowBounds};

// Sources and sinks
pub use sink::{JsonLinesSinkFactory, MemorySinkFactory, OutputSink, SinkFactory};
pub use source::{FactSource, MemoryFactSource, ParquetFactSource, SourceFactory, Table};

// Jobs
pub use jobs::{IndexJob, JobContext, JobReport, job_by_name, job_names, resolve_jobs};
pub use orchestrator::{RunReport, run_jobs};

// Arrow types
pub use arrow::record_batch::RecordBatch;
