//! Generic chunked pipeline.
//!
//! One loop drives every job variant: for each key window a strategy
//! refreshes its window-scoped caches, streams the window's rows and
//! assembles each row into a document. Caches are dropped at the end of each
//! window. Between windows the memory probe is consulted and, above the
//! high-water mark, buffered documents are flushed and committed.

use std::time::Instant;

use crate::assemble::SkipRow;
use crate::error::Result;
use crate::model::Document;
use crate::sink::{DocumentBuffer, OutputSink};
use crate::source::FactSource;
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar, log_warning};

use super::memory::{MemoryProbe, describe_utilization};
use super::window::{KeyWindow, WindowBounds};

/// One variant of the chunked pipeline
pub trait ChunkStrategy {
    /// Primary row streamed per window
    type Row;
    /// Window-scoped caches
    type Caches;

    /// Label used in logs and progress output
    fn name(&self) -> &str;

    /// Key range and window size to scan
    fn window_bounds(&mut self, source: &dyn FactSource) -> Result<WindowBounds>;

    /// Build the caches for one window; failure aborts the job
    fn refresh_caches(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Self::Caches>;

    /// Primary rows of one window, in source order
    fn stream_rows(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Vec<Self::Row>>;

    /// Turn one row into a document, or explain why it was skipped
    fn assemble(&mut self, row: &Self::Row, caches: &Self::Caches) -> std::result::Result<Document, SkipRow>;
}

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub windows: usize,
    pub rows: usize,
    pub documents: usize,
    pub skipped: usize,
    pub pressure_commits: usize,
}

impl PipelineStats {
    /// Add another run's counters
    pub fn absorb(&mut self, other: Self) {
        self.windows += other.windows;
        self.rows += other.rows;
        self.documents += other.documents;
        self.skipped += other.skipped;
        self.pressure_commits += other.pressure_commits;
    }
}

/// Drives [`ChunkStrategy`] implementations against one source and sink
pub struct ChunkedPipeline<'a> {
    source: &'a dyn FactSource,
    sink: &'a mut dyn OutputSink,
    buffer: DocumentBuffer,
    probe: Box<dyn MemoryProbe>,
    high_water: f64,
    show_progress: bool,
}

impl<'a> ChunkedPipeline<'a> {
    #[must_use]
    pub fn new(
        source: &'a dyn FactSource,
        sink: &'a mut dyn OutputSink,
        buffer_size: usize,
        probe: Box<dyn MemoryProbe>,
        high_water: f64,
    ) -> Self {
        Self {
            source,
            sink,
            buffer: DocumentBuffer::new(buffer_size),
            probe,
            high_water,
            show_progress: false,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run a strategy over all of its windows
    ///
    /// Buffered documents are flushed to the sink before returning; the final
    /// commit is left to the caller.
    pub fn run<S: ChunkStrategy>(&mut self, strategy: &mut S) -> Result<PipelineStats> {
        let start = Instant::now();
        let bounds = strategy.window_bounds(self.source)?;
        let plan = bounds.plan()?;
        log::info!(
            "{}: scanning keys ({}, {}] in windows of {}",
            strategy.name(),
            bounds.lower,
            bounds.max.unwrap_or(bounds.lower),
            bounds.chunk
        );

        let pb = create_main_progress_bar(plan.remaining(), Some(strategy.name()), self.show_progress);
        let mut stats = PipelineStats::default();
        for window in plan {
            let window_stats = self.run_window(strategy, window)?;
            stats.absorb(window_stats);
            pb.inc(1);

            if let Some(ratio) = self.memory_pressure() {
                log::info!(
                    "{}: {} after window {window}, committing",
                    strategy.name(),
                    describe_utilization(ratio)
                );
                self.buffer.flush(self.sink)?;
                self.sink.commit(false)?;
                stats.pressure_commits += 1;
            }
        }
        self.buffer.flush(self.sink)?;
        finish_progress_bar(&pb, None);

        log::info!(
            "{}: {} documents from {} rows in {} windows ({} skipped) in {:?}",
            strategy.name(),
            stats.documents,
            stats.rows,
            stats.windows,
            stats.skipped,
            start.elapsed()
        );
        Ok(stats)
    }

    fn run_window<S: ChunkStrategy>(&mut self, strategy: &mut S, window: KeyWindow) -> Result<PipelineStats> {
        let mut stats = PipelineStats {
            windows: 1,
            ..PipelineStats::default()
        };
        let caches = strategy.refresh_caches(self.source, window)?;
        let rows = strategy.stream_rows(self.source, window)?;
        stats.rows = rows.len();
        for row in &rows {
            match strategy.assemble(row, &caches) {
                Ok(document) => {
                    self.buffer.push(document, self.sink)?;
                    stats.documents += 1;
                }
                Err(skip) => {
                    log_warning(&skip.to_string(), Some(strategy.name()));
                    stats.skipped += 1;
                }
            }
        }
        drop(rows);
        drop(caches);
        log::debug!(
            "{}: window {window} produced {} documents",
            strategy.name(),
            stats.documents
        );
        Ok(stats)
    }

    /// Utilization reading when it exceeds the high-water mark
    fn memory_pressure(&mut self) -> Option<f64> {
        self.probe
            .utilization()
            .filter(|ratio| *ratio > self.high_water)
    }

    /// Documents handed to the sink so far
    #[must_use]
    pub fn flushed(&self) -> usize {
        self.buffer.flushed()
    }
}
