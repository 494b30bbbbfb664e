//! `gxdResult`: one document per classical result and per RNA-seq measurement.
//!
//! Both strategies share the whole-dataset caches held in [`ResultContext`]
//! and rebuild marker, genotype and reference caches for every window.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::{IndexJob, JobContext};
use crate::assemble::{
    SkipRow, StructureExpander, StructureFields, WildTypePolicy, apply_age, apply_call,
    apply_genotype, apply_marker, apply_reference, conditional_note, map_detection_level,
    map_tpm_level,
};
use crate::cache::{
    CellTypeCache, DedupTracker, FacetCaches, GenotypeAlleles, GenotypeInfo, Lookup, MarkerAnnotations,
    MarkerInfo, MultiLookup, ReferenceInfo, StringPool, load_genotype_alleles, load_genotypes,
    load_marker_synonyms, load_markers, load_references,
};
use crate::error::Result;
use crate::model::rows::{
    AssayRow, ClassicalResultRow, ConsolidatedSampleRow, ExperimentRow, ResultImageRow,
    RnaSeqMeasurementRow,
};
use crate::model::{
    AssayKey, Document, ExperimentKey, GenotypeKey, MarkerKey, ReferenceKey, ResultKey, SampleKey,
    TermKey, fields,
};
use crate::ontology::TermClosureIndex;
use crate::scan::{ChunkStrategy, ChunkedPipeline, KeyWindow, PipelineStats, WindowBounds};
use crate::source::{FactSource, FactSourceExt, Table};

pub const NAME: &str = "gxdResult";

/// Classical assay types that never produce result documents
pub const EXCLUDED_ASSAY_TYPES: [&str; 2] = ["Recombinase reporter", "In situ reporter (transgenic)"];

/// Assay type given to every RNA-seq measurement
pub const RNASEQ_ASSAY_TYPE: &str = "RNA-Seq";

#[must_use]
pub fn is_excluded_assay_type(assay_type: &str) -> bool {
    EXCLUDED_ASSAY_TYPES.contains(&assay_type)
}

/// Rebuilds the result collection
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultJob;

impl IndexJob for ResultJob {
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
        let mut shared = ResultContext::load(ctx, source)?;
        let chunks = &ctx.config.chunk_sizes;
        let mut stats = pipeline.run(&mut ClassicalStrategy::new(&mut shared, chunks.classical))?;
        stats.absorb(pipeline.run(&mut RnaSeqStrategy::new(&mut shared, chunks.rnaseq))?);
        Ok(stats)
    }
}

/// Whole-dataset state shared by the result strategies of one job
pub struct ResultContext {
    pub index: TermClosureIndex,
    pub structures: StructureExpander,
    pub annotations: MarkerAnnotations,
    pub facets: FacetCaches,
    pub tracker: DedupTracker,
}

impl ResultContext {
    pub fn load(ctx: &JobContext, source: &dyn FactSource) -> Result<Self> {
        Ok(Self {
            index: ctx.closure_index(source)?,
            structures: StructureExpander::load(source)?,
            annotations: MarkerAnnotations::load(source)?,
            facets: FacetCaches::load(source),
            tracker: DedupTracker::new(),
        })
    }

    fn structure(
        &mut self,
        emaps: TermKey,
        row: &str,
    ) -> std::result::Result<Arc<StructureFields>, SkipRow> {
        self.structures
            .expand(&self.index, emaps, &mut self.tracker)
            .ok_or_else(|| SkipRow::new(row, format!("structure {emaps} has no stage projection")))
    }

    fn apply_marker_facets(&mut self, document: &mut Document, marker: MarkerKey) {
        self.annotations.apply(document, marker, &mut self.tracker);
        self.facets.apply(document, marker);
    }
}

/// Marker nomenclature for one window
#[derive(Debug, Default)]
pub struct MarkerCaches {
    pub markers: Lookup<MarkerKey, MarkerInfo>,
    pub synonyms: MultiLookup<MarkerKey, Arc<str>>,
}

impl MarkerCaches {
    pub fn load(source: &dyn FactSource, keys: &FxHashSet<MarkerKey>) -> Result<Self> {
        Ok(Self {
            markers: load_markers(source, keys.iter().copied())?,
            synonyms: load_marker_synonyms(source, keys.iter().copied())?,
        })
    }

    /// Write the marker fields, or explain why the row cannot be used
    pub fn apply(&self, document: &mut Document, key: MarkerKey, row: &str) -> std::result::Result<&MarkerInfo, SkipRow> {
        let marker = self
            .markers
            .get(&key)
            .ok_or_else(|| SkipRow::new(row, format!("unknown marker {key}")))?;
        apply_marker(document, key, marker, self.synonyms.get(&key))
            .map_err(|reason| SkipRow::new(row, reason))?;
        Ok(marker)
    }

    /// Whether a marker has expression literature; unknown markers are left
    /// for [`MarkerCaches::apply`] to report
    #[must_use]
    pub fn has_expression_literature(&self, key: MarkerKey) -> bool {
        self.markers.get(&key).is_none_or(|m| m.gxd_literature_count > 0)
    }
}

/// Genotypes and their alleles for one window
#[derive(Debug, Default)]
pub struct GenotypeCaches {
    pub genotypes: Lookup<GenotypeKey, GenotypeInfo>,
    pub alleles: Lookup<GenotypeKey, GenotypeAlleles>,
}

impl GenotypeCaches {
    pub fn load(source: &dyn FactSource, keys: &FxHashSet<GenotypeKey>) -> Result<Self> {
        Ok(Self {
            genotypes: load_genotypes(source, keys.iter().copied())?,
            alleles: load_genotype_alleles(source, keys.iter().copied())?,
        })
    }

    pub fn apply(&self, document: &mut Document, key: GenotypeKey, policy: WildTypePolicy) -> Option<&GenotypeInfo> {
        let genotype = self.genotypes.get(&key);
        apply_genotype(document, key, policy, genotype, self.alleles.get(&key));
        genotype
    }
}

/// Assay attributes kept per window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssayInfo {
    pub id: Arc<str>,
    pub probe: Option<Arc<str>>,
    pub antibody: Option<Arc<str>>,
}

/// Window caches of the classical strategies
#[derive(Debug, Default)]
pub struct ClassicalCaches {
    pub assays: Lookup<AssayKey, AssayInfo>,
    pub markers: MarkerCaches,
    pub genotypes: GenotypeCaches,
    pub references: Lookup<ReferenceKey, ReferenceInfo>,
    pub figure_labels: MultiLookup<ResultKey, Arc<str>>,
    pub cell_types: Option<CellTypeCache>,
}

/// Classical results, optionally restricted to results with images
pub struct ClassicalStrategy<'c> {
    shared: &'c mut ResultContext,
    chunk: i64,
    images_only: bool,
    pending: Option<(KeyWindow, Vec<ClassicalResultRow>)>,
}

impl<'c> ClassicalStrategy<'c> {
    pub fn new(shared: &'c mut ResultContext, chunk: i64) -> Self {
        Self {
            shared,
            chunk,
            images_only: false,
            pending: None,
        }
    }

    /// Only results with an image, with cell types and mutant-allele sorting
    pub fn images_only(shared: &'c mut ResultContext, chunk: i64) -> Self {
        Self {
            images_only: true,
            ..Self::new(shared, chunk)
        }
    }

    /// Indexable rows of a window with the markers they reference
    ///
    /// Results of markers without expression literature are dropped.
    fn read_window(
        &self,
        source: &dyn FactSource,
        window: KeyWindow,
    ) -> Result<(Vec<ClassicalResultRow>, MarkerCaches)> {
        let mut rows: Vec<ClassicalResultRow> =
            source.range_rows(Table::ExpressionResult, "result_key", window)?;
        rows.retain(|row| !is_excluded_assay_type(&row.assay_type) && (!self.images_only || row.has_image));
        let marker_keys: FxHashSet<MarkerKey> = rows.iter().map(|r| r.marker_key).collect();
        let markers = MarkerCaches::load(source, &marker_keys)?;
        let before = rows.len();
        rows.retain(|row| markers.has_expression_literature(row.marker_key));
        if rows.len() < before {
            log::debug!(
                "Window {window}: dropped {} results of markers without expression literature",
                before - rows.len()
            );
        }
        Ok((rows, markers))
    }
}

impl ChunkStrategy for ClassicalStrategy<'_> {
    type Row = ClassicalResultRow;
    type Caches = ClassicalCaches;

    fn name(&self) -> &str {
        if self.images_only { "classical results with images" } else { "classical results" }
    }

    fn window_bounds(&mut self, source: &dyn FactSource) -> Result<WindowBounds> {
        let max = source.max_key(Table::ExpressionResult, "result_key")?;
        Ok(WindowBounds::from_zero(max, self.chunk))
    }

    fn refresh_caches(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<ClassicalCaches> {
        let (rows, markers) = self.read_window(source, window)?;

        let assay_keys: FxHashSet<AssayKey> = rows.iter().map(|r| r.assay_key).collect();
        let genotype_keys: FxHashSet<GenotypeKey> = rows.iter().map(|r| r.genotype_key).collect();
        let reference_keys: FxHashSet<ReferenceKey> = rows.iter().map(|r| r.reference_key).collect();
        let imaged: FxHashSet<ResultKey> = rows
            .iter()
            .filter(|r| r.has_image)
            .map(|r| r.result_key)
            .collect();

        let mut pool = StringPool::new();
        let assay_rows: Vec<AssayRow> =
            source.key_rows(Table::Assay, "assay_key", assay_keys.iter().map(|k| k.get()))?;
        let assays = assay_rows
            .into_iter()
            .map(|row| {
                let info = AssayInfo {
                    id: pool.intern(&row.assay_id),
                    probe: pool.intern_opt(row.probe_name.as_deref()),
                    antibody: pool.intern_opt(row.antibody_name.as_deref()),
                };
                (row.assay_key, info)
            })
            .collect();

        let image_rows: Vec<ResultImageRow> =
            source.key_rows(Table::ResultImage, "result_key", imaged.iter().map(|k| k.get()))?;
        let mut figure_labels = MultiLookup::new();
        for row in image_rows {
            figure_labels.push_unique(row.result_key, pool.intern(&row.figure_label));
        }

        let cell_types = match CellTypeCache::load(source, rows.iter().map(|r| r.result_key)) {
            Ok(cache) => Some(cache),
            Err(e) => {
                log::error!("Cell types unavailable for window {window}, omitting them: {e}");
                None
            }
        };

        let caches = ClassicalCaches {
            assays,
            markers,
            genotypes: GenotypeCaches::load(source, &genotype_keys)?,
            references: load_references(source, reference_keys)?,
            figure_labels,
            cell_types,
        };
        log::debug!(
            "Window {window}: {} assays, {} markers, {} genotypes cached",
            caches.assays.len(),
            caches.markers.markers.len(),
            caches.genotypes.genotypes.len()
        );
        self.pending = Some((window, rows));
        Ok(caches)
    }

    fn stream_rows(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Vec<ClassicalResultRow>> {
        match self.pending.take() {
            Some((pending, rows)) if pending == window => Ok(rows),
            _ => Ok(self.read_window(source, window)?.0),
        }
    }

    fn assemble(
        &mut self,
        row: &ClassicalResultRow,
        caches: &ClassicalCaches,
    ) -> std::result::Result<Document, SkipRow> {
        let label = format!("result {}", row.result_key);
        let assay = caches
            .assays
            .get(&row.assay_key)
            .ok_or_else(|| SkipRow::new(&label, format!("unknown assay {}", row.assay_key)))?;
        let structure = self.shared.structure(row.emaps_key, &label)?;

        let mut document = Document::new(format!("{}-{}", row.assay_type, row.result_key));
        let marker = caches.markers.apply(&mut document, row.marker_key, &label)?;
        document.set(fields::A_BY_SYMBOL, marker.by_symbol);

        document.set(fields::RESULT_KEY, row.result_key.get());
        document.set(fields::ASSAY_KEY, row.assay_key.get());
        document.set(fields::ASSAY_ID, Arc::clone(&assay.id));
        document.set(fields::ASSAY_TYPE, row.assay_type.as_str());
        document.set_opt(fields::PROBE, assay.probe.clone());
        document.set_opt(fields::ANTIBODY, assay.antibody.clone());
        document.set_opt(fields::PATTERN, row.pattern.as_deref());
        if row.has_image {
            document.set_list(fields::FIGURE_LABELS, caches.figure_labels.get(&row.result_key).to_vec());
        }

        structure.apply(&mut document);
        apply_age(&mut document, row.age_label.as_deref(), row.age_min, row.age_max);
        document.set_opt(fields::SEX, row.sex.as_deref());
        document.set(fields::DETECTION_LEVEL, row.detection_level.as_str());
        apply_call(
            &mut document,
            &structure,
            row.marker_key,
            map_detection_level(&row.detection_level),
        );

        let genotype = caches
            .genotypes
            .apply(&mut document, row.genotype_key, WildTypePolicy::FlagOrNoGenotype);
        let conditional = genotype.is_some_and(|g| g.is_conditional);
        document.set_opt(fields::RESULT_NOTE, conditional_note(conditional, None));
        if let Some(reference) = caches.references.get(&row.reference_key) {
            apply_reference(&mut document, reference);
        }

        if let Some(cell_types) = &caches.cell_types {
            document.set_list(fields::CELL_TYPE, cell_types.names(row.result_key).to_vec());
            if self.images_only {
                document.set_list(fields::CELL_TYPE_ID, cell_types.ids(row.result_key).to_vec());
                document.set_list(fields::CELL_TYPE_HEADER, cell_types.headers(row.result_key).to_vec());
            }
        }
        if self.images_only {
            let alleles = genotype.and_then(|g| g.allele_combination.clone());
            document.set(fields::BY_MUTANT_ALLELES, alleles.unwrap_or_else(|| Arc::from("")));
        }

        self.shared.apply_marker_facets(&mut document, row.marker_key);
        Ok(document)
    }
}

/// Consolidated samples with their experiments, genotypes and references
#[derive(Debug, Default)]
pub struct SampleCaches {
    pub samples: Lookup<SampleKey, ConsolidatedSampleRow>,
    pub experiments: Lookup<ExperimentKey, ExperimentRow>,
    pub references: Lookup<ReferenceKey, ReferenceInfo>,
    pub genotypes: GenotypeCaches,
}

impl SampleCaches {
    pub fn load(source: &dyn FactSource, sample_keys: &FxHashSet<SampleKey>) -> Result<Self> {
        let samples: Vec<ConsolidatedSampleRow> = source.key_rows(
            Table::ConsolidatedSample,
            "sample_key",
            sample_keys.iter().map(|k| k.get()),
        )?;
        Self::from_samples(source, samples)
    }

    /// Build the caches around sample rows already read
    pub fn from_samples(source: &dyn FactSource, samples: Vec<ConsolidatedSampleRow>) -> Result<Self> {
        let experiment_keys: FxHashSet<i64> = samples.iter().map(|s| s.experiment_key.get()).collect();
        let genotype_keys: FxHashSet<GenotypeKey> = samples.iter().map(|s| s.genotype_key).collect();
        let experiments: Vec<ExperimentRow> =
            source.key_rows(Table::RnaSeqExperiment, "experiment_key", experiment_keys)?;
        let references = load_references(source, experiments.iter().filter_map(|e| e.reference_key))?;

        Ok(Self {
            samples: samples.into_iter().map(|s| (s.sample_key, s)).collect(),
            experiments: experiments.into_iter().map(|e| (e.experiment_key, e)).collect(),
            references,
            genotypes: GenotypeCaches::load(source, &genotype_keys)?,
        })
    }

    /// Experiment of a sample
    #[must_use]
    pub fn experiment(&self, sample: &ConsolidatedSampleRow) -> Option<&ExperimentRow> {
        self.experiments.get(&sample.experiment_key)
    }

    /// Reference of an experiment, when it has one
    #[must_use]
    pub fn reference(&self, experiment: &ExperimentRow) -> Option<&ReferenceInfo> {
        experiment.reference_key.and_then(|key| self.references.get(&key))
    }
}

/// Window caches of the RNA-seq strategy
#[derive(Debug, Default)]
pub struct RnaSeqCaches {
    pub samples: SampleCaches,
    pub markers: MarkerCaches,
}

/// RNA-seq measurements; assays sort after every classical assay
pub struct RnaSeqStrategy<'c> {
    shared: &'c mut ResultContext,
    chunk: i64,
    max_by_symbol: i64,
    pending: Option<(KeyWindow, Vec<RnaSeqMeasurementRow>)>,
}

impl<'c> RnaSeqStrategy<'c> {
    pub fn new(shared: &'c mut ResultContext, chunk: i64) -> Self {
        Self {
            shared,
            chunk,
            max_by_symbol: 0,
            pending: None,
        }
    }
}

impl ChunkStrategy for RnaSeqStrategy<'_> {
    type Row = RnaSeqMeasurementRow;
    type Caches = RnaSeqCaches;

    fn name(&self) -> &str {
        "RNA-seq measurements"
    }

    fn window_bounds(&mut self, source: &dyn FactSource) -> Result<WindowBounds> {
        self.max_by_symbol = source.max_key(Table::Marker, "by_symbol")?.unwrap_or(0);
        let max = source.max_key(Table::RnaSeqMeasurement, "measurement_key")?;
        Ok(WindowBounds::from_zero(max, self.chunk))
    }

    fn refresh_caches(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<RnaSeqCaches> {
        let rows: Vec<RnaSeqMeasurementRow> =
            source.range_rows(Table::RnaSeqMeasurement, "measurement_key", window)?;
        let sample_keys: FxHashSet<SampleKey> = rows.iter().map(|r| r.sample_key).collect();
        let marker_keys: FxHashSet<MarkerKey> = rows.iter().map(|r| r.marker_key).collect();

        let caches = RnaSeqCaches {
            samples: SampleCaches::load(source, &sample_keys)?,
            markers: MarkerCaches::load(source, &marker_keys)?,
        };
        log::debug!(
            "Window {window}: {} samples, {} markers cached",
            caches.samples.samples.len(),
            caches.markers.markers.len()
        );
        self.pending = Some((window, rows));
        Ok(caches)
    }

    fn stream_rows(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Vec<RnaSeqMeasurementRow>> {
        match self.pending.take() {
            Some((pending, rows)) if pending == window => Ok(rows),
            _ => source.range_rows(Table::RnaSeqMeasurement, "measurement_key", window),
        }
    }

    fn assemble(
        &mut self,
        row: &RnaSeqMeasurementRow,
        caches: &RnaSeqCaches,
    ) -> std::result::Result<Document, SkipRow> {
        let label = format!("measurement {}", row.measurement_key);
        let sample = caches
            .samples
            .samples
            .get(&row.sample_key)
            .ok_or_else(|| SkipRow::new(&label, format!("unknown sample {}", row.sample_key)))?;
        let experiment = caches.samples.experiment(sample).ok_or_else(|| {
            SkipRow::new(&label, format!("unknown experiment {}", sample.experiment_key))
        })?;
        let structure = self.shared.structure(sample.emaps_key, &label)?;

        let mut document = Document::new(format!(
            "{RNASEQ_ASSAY_TYPE}-rnaseq{}",
            row.measurement_key
        ));
        caches.markers.apply(&mut document, row.marker_key, &label)?;

        document.set(fields::ASSAY_TYPE, RNASEQ_ASSAY_TYPE);
        document.set(fields::SAMPLE_KEY, row.sample_key.get());
        document.set(fields::EXPERIMENT_ID, experiment.experiment_id.as_str());
        document.set(fields::EXPERIMENT_TITLE, experiment.title.as_str());
        document.set(fields::TPM_LEVEL, row.level.as_str());
        document.set(fields::AVG_QN_TPM, format!("{:.2}", row.avg_qn_tpm));
        document.set(fields::REPLICATE_COUNT, i64::from(sample.replicate_count));

        structure.apply(&mut document);
        apply_age(&mut document, sample.age_label.as_deref(), sample.age_min, sample.age_max);
        document.set(fields::SEX, sample.sex.as_str());
        document.set(fields::DETECTION_LEVEL, row.level.as_str());
        apply_call(&mut document, &structure, row.marker_key, map_tpm_level(&row.level));

        let genotype = caches.samples.genotypes.apply(
            &mut document,
            sample.genotype_key,
            WildTypePolicy::NoGenotypeOrNoAlleles,
        );
        let conditional = genotype.is_some_and(|g| g.is_conditional);
        document.set_opt(fields::RESULT_NOTE, conditional_note(conditional, sample.note.as_deref()));

        let reference = caches.samples.reference(experiment);
        if let Some(reference) = reference {
            apply_reference(&mut document, reference);
        }
        let by_reference = reference.map_or(0, |r| r.by_reference);
        document.set(fields::A_BY_SYMBOL, self.max_by_symbol + by_reference);

        self.shared.apply_marker_facets(&mut document, row.marker_key);
        Ok(document)
    }
}
