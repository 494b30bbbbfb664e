//! In-memory sink, mainly for tests and dry runs.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use super::{OutputSink, SinkFactory};
use crate::error::{IndexerError, Result};
use crate::model::Document;

type Published = Arc<Mutex<FxHashMap<String, Vec<Document>>>>;

/// Sink keeping staged, committed and published documents apart
#[derive(Debug, Default)]
pub struct MemorySink {
    staged: Vec<Document>,
    durable: Vec<Document>,
    visible: Vec<Document>,
    rebuild_pending: bool,
    add_calls: usize,
    commits: usize,
    optimizes: usize,
    publish_to: Option<(Published, String)>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents added since the last commit
    #[must_use]
    pub fn staged(&self) -> &[Document] {
        &self.staged
    }

    /// Documents readers currently see
    #[must_use]
    pub fn visible(&self) -> &[Document] {
        &self.visible
    }

    #[must_use]
    pub const fn add_calls(&self) -> usize {
        self.add_calls
    }

    #[must_use]
    pub const fn commits(&self) -> usize {
        self.commits
    }

    #[must_use]
    pub const fn optimizes(&self) -> usize {
        self.optimizes
    }

    fn publish(&mut self) -> Result<()> {
        let durable = std::mem::take(&mut self.durable);
        if self.rebuild_pending {
            self.visible = durable;
            self.rebuild_pending = false;
        } else {
            self.visible.extend(durable);
        }
        if let Some((published, collection)) = &self.publish_to {
            published
                .lock()
                .map_err(|_| IndexerError::Sink("published collections lock poisoned".into()))?
                .insert(collection.clone(), self.visible.clone());
        }
        Ok(())
    }
}

impl OutputSink for MemorySink {
    fn add_batch(&mut self, documents: Vec<Document>) -> Result<()> {
        self.add_calls += 1;
        self.staged.extend(documents);
        Ok(())
    }

    fn delete_all(&mut self) -> Result<()> {
        self.staged.clear();
        self.durable.clear();
        self.rebuild_pending = true;
        Ok(())
    }

    fn commit(&mut self, wait: bool) -> Result<()> {
        self.commits += 1;
        self.durable.append(&mut self.staged);
        if wait {
            self.publish()?;
        }
        Ok(())
    }

    fn optimize(&mut self, _wait: bool) -> Result<()> {
        self.optimizes += 1;
        Ok(())
    }
}

/// Hands out [`MemorySink`]s that publish into a shared map
#[derive(Debug, Clone, Default)]
pub struct MemorySinkFactory {
    published: Published,
}

impl MemorySinkFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Published documents of a collection, sorted by unique key
    #[must_use]
    pub fn collection(&self, name: &str) -> Vec<Document> {
        let mut documents = self
            .published
            .lock()
            .map(|map| map.get(name).cloned().unwrap_or_default())
            .unwrap_or_default();
        documents.sort_by(|a, b| a.id().cmp(b.id()));
        documents
    }
}

impl SinkFactory for MemorySinkFactory {
    fn open(&self, collection: &str) -> Result<Box<dyn OutputSink>> {
        Ok(Box::new(MemorySink {
            publish_to: Some((Arc::clone(&self.published), collection.to_string())),
            ..MemorySink::default()
        }))
    }
}
