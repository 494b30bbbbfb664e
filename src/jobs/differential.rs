//! `gxdDifferentialMarker`: per-marker exclusivity documents.

use super::observations::{MarkerObservations, MarkerWindows, ObservationScope};
use super::result::MarkerCaches;
use super::{IndexJob, JobContext};
use crate::assemble::SkipRow;
use crate::error::Result;
use crate::exclusivity::MarkerExclusivity;
use crate::model::Document;
use crate::ontology::TermClosureIndex;
use crate::scan::{ChunkStrategy, ChunkedPipeline, KeyWindow, PipelineStats, WindowBounds};
use crate::source::FactSource;
use crate::utils::logging::log_warning;

pub const NAME: &str = "gxdDifferentialMarker";

#[derive(Debug, Clone, Copy, Default)]
pub struct DifferentialMarkerJob;

impl IndexJob for DifferentialMarkerJob {
    fn name(&self) -> &'static str {
        NAME
    }

    fn collection(&self) -> &'static str {
        NAME
    }

    fn populate(
        &self,
        ctx: &JobContext,
        source: &dyn FactSource,
        pipeline: &mut ChunkedPipeline<'_>,
    ) -> Result<PipelineStats> {
        let index = ctx.closure_index(source)?;
        pipeline.run(&mut DifferentialStrategy::new(&index, ctx.config.chunk_sizes.marker))
    }
}

/// Folds each marker's positive classical results into its exclusivity
/// summary; RNA-seq measurements do not take part
pub struct DifferentialStrategy<'i> {
    index: &'i TermClosureIndex,
    windows: MarkerWindows,
}

impl<'i> DifferentialStrategy<'i> {
    #[must_use]
    pub const fn new(index: &'i TermClosureIndex, chunk: i64) -> Self {
        Self {
            index,
            windows: MarkerWindows::new(chunk, ObservationScope::Classical),
        }
    }
}

impl ChunkStrategy for DifferentialStrategy<'_> {
    type Row = MarkerObservations;
    type Caches = MarkerCaches;

    fn name(&self) -> &str {
        "differential markers"
    }

    fn window_bounds(&mut self, source: &dyn FactSource) -> Result<WindowBounds> {
        self.windows.bounds(source)
    }

    fn refresh_caches(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<MarkerCaches> {
        self.windows.refresh(source, window)
    }

    fn stream_rows(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Vec<MarkerObservations>> {
        self.windows.rows(source, window)
    }

    fn assemble(
        &mut self,
        row: &MarkerObservations,
        caches: &MarkerCaches,
    ) -> std::result::Result<Document, SkipRow> {
        let label = format!("marker {}", row.marker);
        let mut document = Document::new(row.marker.to_string());
        caches.apply(&mut document, row.marker, &label)?;

        let mut exclusivity = MarkerExclusivity::new();
        for observation in row.observations.iter().filter(|o| o.expressed) {
            if let Err(e) = exclusivity.observe_structure(self.index, observation.emaps) {
                log_warning(&format!("{label}: ignoring result: {e}"), Some(NAME));
            }
        }
        exclusivity.finalize().apply(&mut document, self.index);
        Ok(document)
    }
}
