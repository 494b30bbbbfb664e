//! Output sinks.
//!
//! A sink is a document collection with full-rebuild semantics: after
//! `delete_all`, any number of `add_batch` calls and a final waiting
//! `commit`, the collection holds exactly the documents added since the
//! delete. Nothing added after `delete_all` is visible to readers before a
//! waiting commit.

pub mod buffer;
pub mod jsonl;
pub mod memory;

use crate::error::Result;
use crate::model::Document;

pub use buffer::DocumentBuffer;
pub use jsonl::{JsonLinesSink, JsonLinesSinkFactory};
pub use memory::{MemorySink, MemorySinkFactory};

/// Document collection written by one job
pub trait OutputSink: Send {
    /// Stage a batch of documents
    fn add_batch(&mut self, documents: Vec<Document>) -> Result<()>;

    /// Discard every document, staged or published
    fn delete_all(&mut self) -> Result<()>;

    /// Make staged documents durable
    ///
    /// With `wait` set the call returns only once the committed state is the
    /// one readers see. Without it the documents are durable but publication
    /// may be deferred to the next waiting commit.
    fn commit(&mut self, wait: bool) -> Result<()>;

    /// Compact the committed collection
    fn optimize(&mut self, wait: bool) -> Result<()>;
}

/// Opens one sink per collection
pub trait SinkFactory: Send + Sync {
    fn open(&self, collection: &str) -> Result<Box<dyn OutputSink>>;
}
