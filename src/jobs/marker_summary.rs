//! `gxdMarker`: one document per marker with expression data.
//!
//! Every classical result and RNA-seq measurement of a marker adds to its
//! search filters: assay types, stages, structures, calls, age bins,
//! specimen kinds and references. Unlike the profile and differential jobs,
//! mutant specimens and uncertain calls are kept. Reporter assays are not.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::result::{MarkerCaches, RNASEQ_ASSAY_TYPE, SampleCaches, is_excluded_assay_type};
use super::{IndexJob, JobContext};
use crate::assemble::{AgeBin, SkipRow, WildTypePolicy, age_bins, map_detection_level, map_tpm_level};
use crate::cache::{FacetCaches, GenotypeInfo, Lookup, load_genotypes, load_references};
use crate::error::Result;
use crate::model::rows::{ClassicalResultRow, ConsolidatedSampleRow, RnaSeqMeasurementRow};
use crate::model::{Document, GenotypeKey, MarkerKey, TermKey, fields};
use crate::ontology::TermClosureIndex;
use crate::scan::{ChunkStrategy, ChunkedPipeline, KeyWindow, PipelineStats, WindowBounds};
use crate::source::{FactSource, FactSourceExt, Table};

pub const NAME: &str = "gxdMarker";

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerSummaryJob;

impl IndexJob for MarkerSummaryJob {
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
        let facets = FacetCaches::load(source);
        pipeline.run(&mut MarkerSummaryStrategy::new(
            &index,
            &facets,
            ctx.config.chunk_sizes.marker,
        ))
    }
}

/// What one result contributes to its marker
struct ResultFacts<'a> {
    assay_type: &'a str,
    emaps: TermKey,
    call: &'a str,
    age_min: Option<f64>,
    age_max: Option<f64>,
    wild_type: &'static str,
    jnum_id: Option<&'a Arc<str>>,
}

/// Search filters gathered from every result of one marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSummary {
    pub marker: MarkerKey,
    pub assay_types: BTreeSet<String>,
    /// EMAPS structures
    pub structures: BTreeSet<TermKey>,
    pub calls: BTreeSet<String>,
    pub ages: BTreeSet<AgeBin>,
    pub wild_type: BTreeSet<&'static str>,
    pub jnum_ids: BTreeSet<Arc<str>>,
}

impl MarkerSummary {
    #[must_use]
    pub const fn new(marker: MarkerKey) -> Self {
        Self {
            marker,
            assay_types: BTreeSet::new(),
            structures: BTreeSet::new(),
            calls: BTreeSet::new(),
            ages: BTreeSet::new(),
            wild_type: BTreeSet::new(),
            jnum_ids: BTreeSet::new(),
        }
    }

    fn record(&mut self, facts: &ResultFacts<'_>) {
        if !self.assay_types.contains(facts.assay_type) {
            self.assay_types.insert(facts.assay_type.to_string());
        }
        if !self.calls.contains(facts.call) {
            self.calls.insert(facts.call.to_string());
        }
        self.structures.insert(facts.emaps);
        self.ages.extend(age_bins(facts.age_min, facts.age_max));
        self.wild_type.insert(facts.wild_type);
        if let Some(jnum_id) = facts.jnum_id {
            self.jnum_ids.insert(Arc::clone(jnum_id));
        }
    }
}

fn wild_type_label(
    policy: WildTypePolicy,
    genotypes: &Lookup<GenotypeKey, GenotypeInfo>,
    key: GenotypeKey,
) -> &'static str {
    let genotype = genotypes.get(&key);
    policy.label(
        key,
        genotype.map(|g| g.is_wild_type),
        genotype.and_then(|g| g.allele_combination.as_deref()),
    )
}

/// Summaries of every marker whose key lies in `window`, in key order
pub fn load_summaries(source: &dyn FactSource, window: KeyWindow) -> Result<Vec<MarkerSummary>> {
    let mut summaries: BTreeMap<MarkerKey, MarkerSummary> = BTreeMap::new();

    let mut classical: Vec<ClassicalResultRow> =
        source.range_rows(Table::ExpressionResult, "marker_key", window)?;
    classical.retain(|row| !is_excluded_assay_type(&row.assay_type));
    let genotypes = load_genotypes(source, classical.iter().map(|r| r.genotype_key))?;
    let references = load_references(source, classical.iter().map(|r| r.reference_key))?;
    for row in &classical {
        summaries
            .entry(row.marker_key)
            .or_insert_with(|| MarkerSummary::new(row.marker_key))
            .record(&ResultFacts {
                assay_type: &row.assay_type,
                emaps: row.emaps_key,
                call: map_detection_level(&row.detection_level),
                age_min: row.age_min,
                age_max: row.age_max,
                wild_type: wild_type_label(WildTypePolicy::FlagOrNoGenotype, &genotypes, row.genotype_key),
                jnum_id: references.get(&row.reference_key).map(|r| &r.jnum_id),
            });
    }

    let measurements: Vec<RnaSeqMeasurementRow> =
        source.range_rows(Table::RnaSeqMeasurement, "marker_key", window)?;
    let sample_keys: FxHashSet<i64> = measurements.iter().map(|m| m.sample_key.get()).collect();
    let samples: Vec<ConsolidatedSampleRow> =
        source.key_rows(Table::ConsolidatedSample, "sample_key", sample_keys)?;
    let samples = SampleCaches::from_samples(source, samples)?;
    for row in &measurements {
        let Some(sample) = samples.samples.get(&row.sample_key) else {
            log::debug!("Measurement {} refers to unknown sample {}", row.measurement_key, row.sample_key);
            continue;
        };
        let reference = samples.experiment(sample).and_then(|e| samples.reference(e));
        summaries
            .entry(row.marker_key)
            .or_insert_with(|| MarkerSummary::new(row.marker_key))
            .record(&ResultFacts {
                assay_type: RNASEQ_ASSAY_TYPE,
                emaps: sample.emaps_key,
                call: map_tpm_level(&row.level),
                age_min: sample.age_min,
                age_max: sample.age_max,
                wild_type: wild_type_label(
                    WildTypePolicy::NoAlleles,
                    &samples.genotypes.genotypes,
                    sample.genotype_key,
                ),
                jnum_id: reference.map(|r| &r.jnum_id),
            });
    }

    Ok(summaries.into_values().collect())
}

fn text_list<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<Arc<str>> {
    values.into_iter().map(Arc::from).collect()
}

pub struct MarkerSummaryStrategy<'c> {
    index: &'c TermClosureIndex,
    facets: &'c FacetCaches,
    chunk: i64,
    pending: Option<(KeyWindow, Vec<MarkerSummary>)>,
}

impl<'c> MarkerSummaryStrategy<'c> {
    #[must_use]
    pub const fn new(index: &'c TermClosureIndex, facets: &'c FacetCaches, chunk: i64) -> Self {
        Self {
            index,
            facets,
            chunk,
            pending: None,
        }
    }
}

impl ChunkStrategy for MarkerSummaryStrategy<'_> {
    type Row = MarkerSummary;
    type Caches = MarkerCaches;

    fn name(&self) -> &str {
        "marker summaries"
    }

    fn window_bounds(&mut self, source: &dyn FactSource) -> Result<WindowBounds> {
        Ok(WindowBounds::from_zero(
            source.max_key(Table::Marker, "marker_key")?,
            self.chunk,
        ))
    }

    fn refresh_caches(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<MarkerCaches> {
        let rows = load_summaries(source, window)?;
        let keys: FxHashSet<MarkerKey> = rows.iter().map(|r| r.marker).collect();
        let caches = MarkerCaches::load(source, &keys)?;
        log::debug!("Window {window}: {} markers with expression data", rows.len());
        self.pending = Some((window, rows));
        Ok(caches)
    }

    fn stream_rows(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Vec<MarkerSummary>> {
        match self.pending.take() {
            Some((pending, rows)) if pending == window => Ok(rows),
            _ => load_summaries(source, window),
        }
    }

    fn assemble(
        &mut self,
        row: &MarkerSummary,
        caches: &MarkerCaches,
    ) -> std::result::Result<Document, SkipRow> {
        let label = format!("marker {}", row.marker);
        let mut document = Document::new(row.marker.to_string());
        caches.apply(&mut document, row.marker, &label)?;
        self.facets.apply(&mut document, row.marker);

        let stages: BTreeSet<i64> = row
            .structures
            .iter()
            .filter_map(|emaps| self.index.stage_projection(*emaps).ok())
            .map(|projection| i64::from(projection.stage.0))
            .collect();
        if !stages.is_empty() {
            document.set(fields::THEILER_STAGE, stages.into_iter().collect::<Vec<i64>>());
        }
        document.set_list(fields::STRUCTURE_EXACT, self.index.sorted_ids(&row.structures));
        document.set_list(fields::ASSAY_TYPE, text_list(row.assay_types.iter().map(String::as_str)));
        document.set_list(fields::IS_EXPRESSED, text_list(row.calls.iter().map(String::as_str)));
        document.set_list(
            fields::AGE_BINS,
            row.ages.iter().map(|bin| Arc::from(bin.label())).collect(),
        );
        document.set_list(fields::IS_WILD_TYPE, text_list(row.wild_type.iter().copied()));
        document.set_list(fields::JNUM_ID, row.jnum_ids.iter().cloned().collect());
        Ok(document)
    }
}
