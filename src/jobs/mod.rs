//! Indexing jobs
//!
//! Each job rebuilds one document collection from scratch by instantiating
//! the chunked pipeline with one or more strategies. Jobs share nothing
//! mutable: every run opens its own fact source, caches and sink.
//!
//! Available jobs:
//! - `gxdResult`: one document per classical result and per RNA-seq measurement
//! - `gxdResultHasImage`: classical results that carry an image
//! - `gxdDagEdge`: direct and descendant EMAPA edges
//! - `gxdDifferentialMarker`: per-marker exclusivity
//! - `gxdProfileMarker`: per-marker positive structure profile
//! - `gxdConsolidatedSample`: RNA-seq consolidated samples
//! - `gxdMarker`: per-marker search filters over every result
//! - `gxdImagePane`: image panes with the results they show

pub mod consolidated_sample;
pub mod dag_edge;
pub mod differential;
pub mod has_image;
pub mod image_pane;
pub mod marker_summary;
pub mod observations;
pub mod profile;
pub mod result;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};
use crate::ontology::{ClosureBuilder, TermClosureIndex};
use crate::scan::{ChunkedPipeline, MemoryProbe, PipelineStats, SystemMemoryProbe};
use crate::sink::SinkFactory;
use crate::source::{FactSource, SourceFactory};
use crate::utils::logging::{log_operation_complete, log_operation_start};

pub use consolidated_sample::ConsolidatedSampleJob;
pub use dag_edge::DagEdgeJob;
pub use differential::DifferentialMarkerJob;
pub use has_image::ResultHasImageJob;
pub use image_pane::ImagePaneJob;
pub use marker_summary::MarkerSummaryJob;
pub use profile::ProfileMarkerJob;
pub use result::ResultJob;

/// Builds the memory probe each pipeline consults between windows
pub type ProbeFactory = Arc<dyn Fn() -> Box<dyn MemoryProbe> + Send + Sync>;

/// Everything a job needs to run
#[derive(Clone)]
pub struct JobContext {
    pub config: IndexerConfig,
    pub sources: Arc<dyn SourceFactory>,
    pub sinks: Arc<dyn SinkFactory>,
    pub probes: ProbeFactory,
}

impl JobContext {
    /// Context probing this process's memory against the configured ceiling
    pub fn new(
        config: IndexerConfig,
        sources: Arc<dyn SourceFactory>,
        sinks: Arc<dyn SinkFactory>,
    ) -> Self {
        let ceiling = config.memory_ceiling_bytes();
        Self {
            config,
            sources,
            sinks,
            probes: Arc::new(move || Box::new(SystemMemoryProbe::new(ceiling)) as Box<dyn MemoryProbe>),
        }
    }

    #[must_use]
    pub fn with_probes(mut self, probes: ProbeFactory) -> Self {
        self.probes = probes;
        self
    }

    /// Build the closure index for a job from its own source
    pub fn closure_index(&self, source: &dyn FactSource) -> Result<TermClosureIndex> {
        ClosureBuilder::new(self.config.chunk_sizes.closure).build(source)
    }
}

/// Outcome of one successful job run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub name: &'static str,
    pub started_at: DateTime<Utc>,
    pub collection: &'static str,
    pub stats: PipelineStats,
    pub elapsed: Duration,
}

/// One collection rebuild
pub trait IndexJob: Send + Sync {
    /// Name used to select the job
    fn name(&self) -> &'static str;

    /// Collection the job rebuilds
    fn collection(&self) -> &'static str;

    /// Whether the collection is optimized after the final commit
    fn optimize(&self) -> bool {
        true
    }

    /// Run every strategy of the job against an already cleared pipeline
    fn populate(
        &self,
        ctx: &JobContext,
        source: &dyn FactSource,
        pipeline: &mut ChunkedPipeline<'_>,
    ) -> Result<PipelineStats>;

    /// Full rebuild: clear the collection, populate it, then publish
    fn run(&self, ctx: &JobContext) -> Result<JobReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        log_operation_start("Rebuilding collection", self.collection());

        let source = ctx.sources.open()?;
        let mut sink = ctx.sinks.open(self.collection())?;
        sink.delete_all()?;
        let stats = {
            let mut pipeline = ChunkedPipeline::new(
                source.as_ref(),
                sink.as_mut(),
                ctx.config.buffer_size,
                (ctx.probes)(),
                ctx.config.memory_high_water,
            )
            .with_progress(ctx.config.show_progress);
            self.populate(ctx, source.as_ref(), &mut pipeline)?
        };
        sink.commit(true)?;
        if self.optimize() {
            sink.optimize(true)?;
        }

        let elapsed = start.elapsed();
        log_operation_complete("indexed", self.collection(), stats.documents, Some(elapsed));
        Ok(JobReport {
            name: self.name(),
            started_at,
            collection: self.collection(),
            stats,
            elapsed,
        })
    }
}

/// Names of every registered job, in run order
#[must_use]
pub const fn job_names() -> [&'static str; 8] {
    [
        result::NAME,
        has_image::NAME,
        dag_edge::NAME,
        differential::NAME,
        profile::NAME,
        consolidated_sample::NAME,
        marker_summary::NAME,
        image_pane::NAME,
    ]
}

/// Create a job from its name
pub fn job_by_name(name: &str) -> Result<Arc<dyn IndexJob>> {
    match name {
        result::NAME => Ok(Arc::new(ResultJob)),
        has_image::NAME => Ok(Arc::new(ResultHasImageJob)),
        dag_edge::NAME => Ok(Arc::new(DagEdgeJob)),
        differential::NAME => Ok(Arc::new(DifferentialMarkerJob)),
        profile::NAME => Ok(Arc::new(ProfileMarkerJob)),
        consolidated_sample::NAME => Ok(Arc::new(ConsolidatedSampleJob)),
        marker_summary::NAME => Ok(Arc::new(MarkerSummaryJob)),
        image_pane::NAME => Ok(Arc::new(ImagePaneJob)),
        other => Err(IndexerError::UnknownJob(other.to_string())),
    }
}

/// Resolve job names, expanding `all`; duplicates are kept once
pub fn resolve_jobs<S: AsRef<str>>(names: &[S]) -> Result<Vec<Arc<dyn IndexJob>>> {
    let mut selected: Vec<&str> = Vec::new();
    for name in names {
        let name = name.as_ref();
        if name == "all" {
            selected.extend(job_names());
        } else {
            selected.push(name);
        }
    }
    let mut jobs: Vec<Arc<dyn IndexJob>> = Vec::with_capacity(selected.len());
    for name in selected {
        if jobs.iter().any(|job| job.name() == name) {
            continue;
        }
        jobs.push(job_by_name(name)?);
    }
    Ok(jobs)
}
