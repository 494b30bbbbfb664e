//! `gxdConsolidatedSample`: one document per RNA-seq consolidated sample.

use super::result::SampleCaches;
use super::{IndexJob, JobContext};
use crate::assemble::{
    SkipRow, StructureExpander, WildTypePolicy, apply_age, apply_reference, conditional_note,
};
use crate::cache::DedupTracker;
use crate::error::Result;
use crate::model::rows::ConsolidatedSampleRow;
use crate::model::{Document, fields};
use crate::ontology::TermClosureIndex;
use crate::scan::{ChunkStrategy, ChunkedPipeline, KeyWindow, PipelineStats, WindowBounds};
use crate::source::{FactSource, FactSourceExt, Table};

pub const NAME: &str = "gxdConsolidatedSample";

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolidatedSampleJob;

impl IndexJob for ConsolidatedSampleJob {
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
        let mut strategy = SampleStrategy {
            index: &index,
            structures: StructureExpander::load(source)?,
            tracker: DedupTracker::new(),
            chunk: ctx.config.chunk_sizes.sample,
            pending: None,
        };
        pipeline.run(&mut strategy)
    }
}

pub struct SampleStrategy<'i> {
    index: &'i TermClosureIndex,
    structures: StructureExpander,
    tracker: DedupTracker,
    chunk: i64,
    pending: Option<(KeyWindow, Vec<ConsolidatedSampleRow>)>,
}

fn read_samples(source: &dyn FactSource, window: KeyWindow) -> Result<Vec<ConsolidatedSampleRow>> {
    source.range_rows(Table::ConsolidatedSample, "sample_key", window)
}

impl ChunkStrategy for SampleStrategy<'_> {
    type Row = ConsolidatedSampleRow;
    type Caches = SampleCaches;

    fn name(&self) -> &str {
        "consolidated samples"
    }

    fn window_bounds(&mut self, source: &dyn FactSource) -> Result<WindowBounds> {
        Ok(WindowBounds::from_zero(
            source.max_key(Table::ConsolidatedSample, "sample_key")?,
            self.chunk,
        ))
    }

    fn refresh_caches(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<SampleCaches> {
        let rows = read_samples(source, window)?;
        let caches = SampleCaches::from_samples(source, rows.clone())?;
        self.pending = Some((window, rows));
        Ok(caches)
    }

    fn stream_rows(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Vec<ConsolidatedSampleRow>> {
        match self.pending.take() {
            Some((pending, rows)) if pending == window => Ok(rows),
            _ => read_samples(source, window),
        }
    }

    fn assemble(
        &mut self,
        sample: &ConsolidatedSampleRow,
        caches: &SampleCaches,
    ) -> std::result::Result<Document, SkipRow> {
        let label = format!("sample {}", sample.sample_key);
        let experiment = caches.experiment(sample).ok_or_else(|| {
            SkipRow::new(&label, format!("unknown experiment {}", sample.experiment_key))
        })?;
        let structure = self
            .structures
            .expand(self.index, sample.emaps_key, &mut self.tracker)
            .ok_or_else(|| {
                SkipRow::new(&label, format!("structure {} has no stage projection", sample.emaps_key))
            })?;

        let mut document = Document::new(sample.sample_key.to_string());
        document.set(fields::SAMPLE_KEY, sample.sample_key.get());
        document.set(fields::EXPERIMENT_ID, experiment.experiment_id.as_str());
        document.set(fields::EXPERIMENT_TITLE, experiment.title.as_str());
        document.set(fields::REPLICATE_COUNT, i64::from(sample.replicate_count));
        document.set(fields::SEX, sample.sex.as_str());
        structure.apply(&mut document);
        apply_age(&mut document, sample.age_label.as_deref(), sample.age_min, sample.age_max);

        let genotype = caches.genotypes.apply(
            &mut document,
            sample.genotype_key,
            WildTypePolicy::NoGenotypeOrNoAlleles,
        );
        let conditional = genotype.is_some_and(|g| g.is_conditional);
        document.set_opt(fields::RESULT_NOTE, conditional_note(conditional, sample.note.as_deref()));
        if let Some(reference) = caches.reference(experiment) {
            apply_reference(&mut document, reference);
        }
        Ok(document)
    }
}
