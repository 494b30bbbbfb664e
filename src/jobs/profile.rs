//! `gxdProfileMarker`: structures each marker is positively expressed in.
//!
//! Classical and RNA-seq results are profiled separately. The `anc` fields
//! hold reflexive closures, so a structure is always among its own
//! ancestors there.

use rustc_hash::FxHashSet;

use super::observations::{MarkerObservations, MarkerWindows, ObservationScope, ResultSource};
use super::result::MarkerCaches;
use super::{IndexJob, JobContext};
use crate::assemble::SkipRow;
use crate::error::Result;
use crate::model::{Document, TermKey, fields};
use crate::ontology::TermClosureIndex;
use crate::scan::{ChunkStrategy, ChunkedPipeline, KeyWindow, PipelineStats, WindowBounds};
use crate::source::FactSource;
use crate::utils::logging::log_warning;

pub const NAME: &str = "gxdProfileMarker";

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileMarkerJob;

impl IndexJob for ProfileMarkerJob {
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
        pipeline.run(&mut ProfileStrategy::new(&index, ctx.config.chunk_sizes.marker))
    }
}

/// Positive structures of one kind of result
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PositiveProfile {
    pub emaps_exact: FxHashSet<TermKey>,
    pub emaps_ancestors: FxHashSet<TermKey>,
    pub emapa_exact: FxHashSet<TermKey>,
    pub emapa_ancestors: FxHashSet<TermKey>,
}

impl PositiveProfile {
    /// Profile of a marker's positive results of one kind
    pub fn build(index: &TermClosureIndex, marker: &MarkerObservations, source: ResultSource) -> Self {
        let mut profile = Self::default();
        for observation in marker.positive(source) {
            let emaps = observation.emaps;
            let (projection, closure) = match (
                index.stage_projection(emaps),
                index.emapa_closure_of_emaps(emaps),
            ) {
                (Ok(projection), Ok(closure)) => (projection, closure),
                (Err(e), _) | (_, Err(e)) => {
                    log_warning(
                        &format!("marker {}: ignoring result: {e}", marker.marker),
                        Some(NAME),
                    );
                    continue;
                }
            };
            profile.emaps_exact.insert(emaps);
            profile.emaps_ancestors.extend(index.ancestors_inclusive(emaps));
            profile.emapa_exact.insert(projection.emapa);
            profile.emapa_ancestors.extend(closure);
        }
        profile
    }

    fn apply(&self, document: &mut Document, index: &TermClosureIndex, names: [&'static str; 4]) {
        let [emaps_exact, emaps_anc, emapa_exact, emapa_anc] = names;
        document.set_list(emaps_exact, index.sorted_ids(&self.emaps_exact));
        document.set_list(emaps_anc, index.sorted_ids(&self.emaps_ancestors));
        document.set_list(emapa_exact, index.sorted_ids(&self.emapa_exact));
        document.set_list(emapa_anc, index.sorted_ids(&self.emapa_ancestors));
    }
}

const CLASSICAL_FIELDS: [&str; 4] = [
    fields::POS_C_EMAPS_EXACT,
    fields::POS_C_EMAPS_ANC,
    fields::POS_C_EMAPA_EXACT,
    fields::POS_C_EMAPA_ANC,
];

const RNASEQ_FIELDS: [&str; 4] = [
    fields::POS_R_EMAPS_EXACT,
    fields::POS_R_EMAPS_ANC,
    fields::POS_R_EMAPA_EXACT,
    fields::POS_R_EMAPA_ANC,
];

pub struct ProfileStrategy<'i> {
    index: &'i TermClosureIndex,
    windows: MarkerWindows,
}

impl<'i> ProfileStrategy<'i> {
    #[must_use]
    pub const fn new(index: &'i TermClosureIndex, chunk: i64) -> Self {
        Self {
            index,
            windows: MarkerWindows::new(chunk, ObservationScope::ClassicalAndRnaSeq),
        }
    }
}

impl ChunkStrategy for ProfileStrategy<'_> {
    type Row = MarkerObservations;
    type Caches = MarkerCaches;

    fn name(&self) -> &str {
        "marker profiles"
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

        PositiveProfile::build(self.index, row, ResultSource::Classical).apply(
            &mut document,
            self.index,
            CLASSICAL_FIELDS,
        );
        PositiveProfile::build(self.index, row, ResultSource::RnaSeq).apply(
            &mut document,
            self.index,
            RNASEQ_FIELDS,
        );
        Ok(document)
    }
}
