//! Document buffering between the assembler and the sink.

use crate::error::Result;
use crate::model::Document;

use super::OutputSink;

/// Collects documents and hands them to a sink in batches of `capacity`
#[derive(Debug)]
pub struct DocumentBuffer {
    documents: Vec<Document>,
    capacity: usize,
    flushed: usize,
    batches: usize,
}

impl DocumentBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            documents: Vec::with_capacity(capacity),
            capacity,
            flushed: 0,
            batches: 0,
        }
    }

    /// Add a document, flushing when the buffer reaches capacity
    pub fn push(&mut self, document: Document, sink: &mut dyn OutputSink) -> Result<()> {
        self.documents.push(document);
        if self.documents.len() >= self.capacity {
            self.flush(sink)?;
        }
        Ok(())
    }

    /// Hand every buffered document to the sink
    pub fn flush(&mut self, sink: &mut dyn OutputSink) -> Result<()> {
        if self.documents.is_empty() {
            return Ok(());
        }
        let batch = std::mem::replace(&mut self.documents, Vec::with_capacity(self.capacity));
        self.flushed += batch.len();
        self.batches += 1;
        sink.add_batch(batch)
    }

    /// Documents waiting for the next flush
    #[must_use]
    pub fn pending(&self) -> usize {
        self.documents.len()
    }

    /// Documents handed to the sink so far
    #[must_use]
    pub const fn flushed(&self) -> usize {
        self.flushed
    }

    /// Batches handed to the sink so far
    #[must_use]
    pub const fn batches(&self) -> usize {
        self.batches
    }
}
