//! JSON-lines sink writing one file per collection.
//!
//! Documents are appended to a hidden staging file. A waiting commit renames
//! the staging file over `<collection>.jsonl`, so readers only ever see the
//! previous complete collection or the new complete one.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{OutputSink, SinkFactory};
use crate::error::Result;
use crate::model::Document;

/// Sink persisting a collection as newline-delimited JSON
#[derive(Debug)]
pub struct JsonLinesSink {
    published: PathBuf,
    staging: PathBuf,
    writer: Option<BufWriter<File>>,
    rebuild_pending: bool,
    written: usize,
}

impl JsonLinesSink {
    /// Open the sink for `collection` inside `dir`, creating `dir` if needed
    pub fn open(dir: &Path, collection: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            published: dir.join(format!("{collection}.jsonl")),
            staging: dir.join(format!(".{collection}.jsonl.staging")),
            writer: None,
            rebuild_pending: false,
            written: 0,
        })
    }

    /// Path readers load the collection from
    #[must_use]
    pub fn published_path(&self) -> &Path {
        &self.published
    }

    /// Documents written since the sink was opened
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                // An incremental commit continues from what readers see now.
                if !self.rebuild_pending {
                    if self.published.is_file() {
                        fs::copy(&self.published, &self.staging)?;
                    } else {
                        File::create(&self.staging)?;
                    }
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.staging)?;
                BufWriter::new(file)
            }
        };
        Ok(self.writer.insert(writer))
    }
}

impl OutputSink for JsonLinesSink {
    fn add_batch(&mut self, documents: Vec<Document>) -> Result<()> {
        let count = documents.len();
        let writer = self.writer()?;
        for document in &documents {
            serde_json::to_writer(&mut *writer, document)?;
            writer.write_all(b"\n")?;
        }
        self.written += count;
        Ok(())
    }

    fn delete_all(&mut self) -> Result<()> {
        self.writer = None;
        File::create(&self.staging)?;
        self.rebuild_pending = true;
        Ok(())
    }

    fn commit(&mut self, wait: bool) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
            writer.get_ref().sync_data()?;
        }
        if wait && (self.writer.is_some() || self.rebuild_pending) {
            self.writer = None;
            if !self.staging.exists() {
                File::create(&self.staging)?;
            }
            fs::rename(&self.staging, &self.published)?;
            self.rebuild_pending = false;
            log::debug!("Published {}", self.published.display());
        }
        Ok(())
    }

    fn optimize(&mut self, _wait: bool) -> Result<()> {
        if self.writer.is_none() && !self.rebuild_pending && self.staging.exists() {
            fs::remove_file(&self.staging)?;
        }
        Ok(())
    }
}

/// Opens [`JsonLinesSink`]s under one output directory
#[derive(Debug, Clone)]
pub struct JsonLinesSinkFactory {
    dir: PathBuf,
}

impl JsonLinesSinkFactory {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SinkFactory for JsonLinesSinkFactory {
    fn open(&self, collection: &str) -> Result<Box<dyn OutputSink>> {
        Ok(Box::new(JsonLinesSink::open(&self.dir, collection)?))
    }
}
