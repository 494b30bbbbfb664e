use std::sync::Arc;

use gxd_indexer::model::rows::{
    AlleleGenotypeRow, AnatomicalSystemRow, AssayRow, ClassicalResultRow, ClosureEdgeRow,
    ConsolidatedSampleRow, DagEdgeRow, EmapaStageRangeRow, EmapsMappingRow, ExperimentRow,
    GenotypeRow, ImagePaneRow, MarkerAnnotationRow, MarkerHeaderRow, MarkerRow, MarkerSynonymRow,
    ReferenceRow, ResultCellTypeRow, ResultImagePaneRow, ResultImageRow, RnaSeqMeasurementRow,
    TermRow, TermSynonymRow, VocabAncestorRow,
};
use gxd_indexer::model::{
    AssayKey, ExperimentKey, GenotypeKey, ImagePaneKey, MarkerKey, MeasurementKey, ReferenceKey, ResultKey,
    SampleKey, Stage, TermKey,
};
use gxd_indexer::scan::{MemoryProbe, ScriptedMemoryProbe};
use gxd_indexer::{
    ChunkSizes, Document, IndexerConfig, JobContext, MemoryFactSource, MemorySinkFactory, Table,
};

// Anatomy used by every fixture:
//
// EMAPA  1 embryo (TS1-28) > 2 brain (TS10-28) > 4 forebrain (TS12-28)
//                          > 3 heart (TS10-28)
//
// EMAPS  TS12: 101 embryo > 102 brain > 103 forebrain, 101 > 104 heart
//        TS20: 105 embryo > 106 brain, 105 > 107 heart
//
// Closure rows are keyed from 201, direct edges from 301.
pub const EMBRYO: i64 = 1;
pub const BRAIN: i64 = 2;
pub const HEART: i64 = 3;
pub const FOREBRAIN: i64 = 4;

pub const EMBRYO_TS12: i64 = 101;
pub const BRAIN_TS12: i64 = 102;
pub const FOREBRAIN_TS12: i64 = 103;
pub const HEART_TS12: i64 = 104;
pub const EMBRYO_TS20: i64 = 105;
pub const BRAIN_TS20: i64 = 106;
pub const HEART_TS20: i64 = 107;

pub const PAX6: i64 = 10;
pub const SHH: i64 = 11;
pub const BAD_COORDINATES: i64 = 12;
pub const SOX2: i64 = 13;

pub const WILD_TYPE_GENOTYPE: i64 = 500;
pub const MUTANT_GENOTYPE: i64 = 501;
/// Flagged wild type, yet carrying an allele combination
pub const FLAGGED_WITH_ALLELES_GENOTYPE: i64 = 502;
/// Not flagged wild type and without an allele combination
pub const UNFLAGGED_NO_ALLELES_GENOTYPE: i64 = 503;

fn term(key: i64, id: &str, name: &str, vocab: &str) -> TermRow {
    TermRow {
        term_key: TermKey(key),
        term_id: id.to_string(),
        term: name.to_string(),
        vocab_name: vocab.to_string(),
        is_obsolete: false,
    }
}

fn closure(key: i64, ancestor: i64, descendant: i64) -> ClosureEdgeRow {
    ClosureEdgeRow {
        edge_key: key,
        ancestor_key: TermKey(ancestor),
        descendant_key: TermKey(descendant),
    }
}

fn edge(key: i64, parent: i64, child: i64) -> DagEdgeRow {
    DagEdgeRow {
        edge_key: key,
        parent_key: TermKey(parent),
        child_key: TermKey(child),
    }
}

fn projection(emaps: i64, emapa: i64, stage: u8) -> EmapsMappingRow {
    EmapsMappingRow {
        emaps_key: TermKey(emaps),
        emapa_key: TermKey(emapa),
        stage: Stage(stage),
    }
}

fn stage_range(emapa: i64, start: u8, end: u8) -> EmapaStageRangeRow {
    EmapaStageRangeRow {
        emapa_key: TermKey(emapa),
        start_stage: Stage(start),
        end_stage: Stage(end),
    }
}

/// Terms, closures, stage projections and ranges of the fixture anatomy
pub fn anatomy_source() -> MemoryFactSource {
    let mut source = MemoryFactSource::new();
    source
        .insert_rows(
            Table::Term,
            &[
                term(EMBRYO, "EMAPA:1", "embryo", "EMAPA"),
                term(BRAIN, "EMAPA:2", "brain", "EMAPA"),
                term(HEART, "EMAPA:3", "heart", "EMAPA"),
                term(FOREBRAIN, "EMAPA:4", "forebrain", "EMAPA"),
                term(EMBRYO_TS12, "EMAPS:101", "embryo", "EMAPS"),
                term(BRAIN_TS12, "EMAPS:102", "brain", "EMAPS"),
                term(FOREBRAIN_TS12, "EMAPS:103", "forebrain", "EMAPS"),
                term(HEART_TS12, "EMAPS:104", "heart", "EMAPS"),
                term(EMBRYO_TS20, "EMAPS:105", "embryo", "EMAPS"),
                term(BRAIN_TS20, "EMAPS:106", "brain", "EMAPS"),
                term(HEART_TS20, "EMAPS:107", "heart", "EMAPS"),
                term(900, "CL:1", "neuron", "Cell Ontology"),
            ],
        )
        .unwrap();
    source
        .insert_rows(
            Table::DagClosure,
            &[
                closure(201, EMBRYO, BRAIN),
                closure(202, EMBRYO, HEART),
                closure(203, EMBRYO, FOREBRAIN),
                closure(204, BRAIN, FOREBRAIN),
                closure(205, BRAIN, BRAIN),
                closure(206, EMBRYO_TS12, BRAIN_TS12),
                closure(207, EMBRYO_TS12, FOREBRAIN_TS12),
                closure(208, EMBRYO_TS12, HEART_TS12),
                closure(209, BRAIN_TS12, FOREBRAIN_TS12),
                closure(210, EMBRYO_TS20, BRAIN_TS20),
                closure(211, EMBRYO_TS20, HEART_TS20),
            ],
        )
        .unwrap();
    source
        .insert_rows(
            Table::DagEdge,
            &[
                edge(301, EMBRYO, BRAIN),
                edge(302, EMBRYO, HEART),
                edge(303, BRAIN, FOREBRAIN),
                edge(304, EMBRYO_TS12, BRAIN_TS12),
                edge(305, BRAIN_TS12, FOREBRAIN_TS12),
                edge(306, EMBRYO_TS12, HEART_TS12),
                edge(307, EMBRYO_TS20, BRAIN_TS20),
                edge(308, EMBRYO_TS20, HEART_TS20),
            ],
        )
        .unwrap();
    source
        .insert_rows(
            Table::EmapsMapping,
            &[
                projection(EMBRYO_TS12, EMBRYO, 12),
                projection(BRAIN_TS12, BRAIN, 12),
                projection(FOREBRAIN_TS12, FOREBRAIN, 12),
                projection(HEART_TS12, HEART, 12),
                projection(EMBRYO_TS20, EMBRYO, 20),
                projection(BRAIN_TS20, BRAIN, 20),
                projection(HEART_TS20, HEART, 20),
            ],
        )
        .unwrap();
    source
        .insert_rows(
            Table::EmapaStageRange,
            &[
                stage_range(EMBRYO, 1, 28),
                stage_range(BRAIN, 10, 28),
                stage_range(HEART, 10, 28),
                stage_range(FOREBRAIN, 12, 28),
            ],
        )
        .unwrap();
    source
        .insert_rows(
            Table::TermSynonym,
            &[TermSynonymRow {
                term_key: TermKey(BRAIN),
                synonym: "encephalon".to_string(),
            }],
        )
        .unwrap();
    source
        .insert_rows(
            Table::AnatomicalSystem,
            &[
                AnatomicalSystemRow {
                    emapa_key: TermKey(BRAIN),
                    system: "nervous system".to_string(),
                },
                AnatomicalSystemRow {
                    emapa_key: TermKey(HEART),
                    system: "cardiovascular system".to_string(),
                },
            ],
        )
        .unwrap();
    source
}

fn marker(key: i64, symbol: &str, by_symbol: i64, start: Option<&str>, end: Option<&str>) -> MarkerRow {
    MarkerRow {
        marker_key: MarkerKey(key),
        primary_id: format!("MGI:{key}"),
        symbol: symbol.to_string(),
        name: format!("{symbol} gene"),
        marker_type: "Gene".to_string(),
        chromosome: Some("2".to_string()),
        cm_offset: Some(-1.0),
        start_coordinate: start.map(str::to_string),
        end_coordinate: end.map(str::to_string),
        strand: Some("+".to_string()),
        by_symbol,
        gxd_literature_count: 1,
    }
}

#[allow(clippy::too_many_arguments)]
fn result(
    key: i64,
    assay: i64,
    assay_type: &str,
    marker: i64,
    genotype: i64,
    emaps: i64,
    level: &str,
    has_image: bool,
) -> ClassicalResultRow {
    ClassicalResultRow {
        result_key: ResultKey(key),
        assay_key: AssayKey(assay),
        assay_type: assay_type.to_string(),
        marker_key: MarkerKey(marker),
        genotype_key: GenotypeKey(genotype),
        reference_key: ReferenceKey(900),
        emaps_key: TermKey(emaps),
        age_min: Some(10.5),
        age_max: Some(10.5),
        age_label: Some("embryonic day 10.5".to_string()),
        sex: Some("Pooled".to_string()),
        detection_level: level.to_string(),
        pattern: None,
        has_image,
    }
}

fn assay(key: i64, marker: i64, assay_type_seq: Option<i64>) -> AssayRow {
    AssayRow {
        assay_key: AssayKey(key),
        assay_id: format!("MGI:A{key}"),
        marker_key: MarkerKey(marker),
        reference_key: ReferenceKey(900),
        probe_name: Some(format!("probe {key}")),
        antibody_name: None,
        assay_type_seq,
    }
}

fn sample(key: i64, genotype: i64, emaps: i64, sex: &str, note: Option<&str>) -> ConsolidatedSampleRow {
    ConsolidatedSampleRow {
        sample_key: SampleKey(key),
        experiment_key: ExperimentKey(700),
        genotype_key: GenotypeKey(genotype),
        emaps_key: TermKey(emaps),
        age_min: Some(12.0),
        age_max: Some(12.0),
        age_label: Some("embryonic day 12".to_string()),
        sex: sex.to_string(),
        replicate_count: 3,
        note: note.map(str::to_string),
    }
}

fn measurement(key: i64, sample: i64, marker: i64, level: &str, tpm: f64) -> RnaSeqMeasurementRow {
    RnaSeqMeasurementRow {
        measurement_key: MeasurementKey(key),
        sample_key: SampleKey(sample),
        marker_key: MarkerKey(marker),
        level: level.to_string(),
        avg_qn_tpm: tpm,
    }
}

/// Full fixture: anatomy plus markers, classical results and RNA-seq data
///
/// Classical results:
/// - 1: Pax6, wild type, forebrain TS12, Present, with image and cell type
/// - 2: Pax6, wild type, brain TS20, Strong
/// - 3: Shh, conditional mutant, heart TS12, Absent, with image
/// - 4: marker with unparseable coordinates, brain TS12, Present
/// - 5: Pax6 reporter assay, always excluded
/// - 6: Shh, no genotype, heart TS20, Ambiguous
///
/// RNA-seq measurements:
/// - 1: Shh in wild-type brain TS12, High
/// - 2: Pax6 in mutant heart TS12, Below Cutoff
/// - 3: Pax6 in wild-type brain TS12, Medium
///
/// Image panes:
/// - 1: results 1, 2 (Pax6, section) and 3 (Shh)
/// - 2: result 2, but no pixel store image
/// - 3: no results
/// - 4: result 3 without a specimen label
pub fn expression_source() -> MemoryFactSource {
    let mut source = anatomy_source();
    source.insert_rows(Table::Marker, &markers()).unwrap();
    source
        .insert_rows(
            Table::MarkerSynonym,
            &[MarkerSynonymRow {
                marker_key: MarkerKey(PAX6),
                synonym: "Dey".to_string(),
            }],
        )
        .unwrap();
    source
        .insert_rows(
            Table::MarkerAnnotation,
            &[MarkerAnnotationRow {
                marker_key: MarkerKey(PAX6),
                vocab_name: "GO".to_string(),
                term_id: "GO:2".to_string(),
                term: "eye development".to_string(),
            }],
        )
        .unwrap();
    source
        .insert_rows(
            Table::VocabAncestor,
            &[VocabAncestorRow {
                term_id: "GO:2".to_string(),
                ancestor_id: "GO:1".to_string(),
                ancestor_term: "development".to_string(),
            }],
        )
        .unwrap();
    source
        .insert_rows(
            Table::MarkerMpHeader,
            &[MarkerHeaderRow {
                marker_key: MarkerKey(PAX6),
                header: "vision/eye".to_string(),
            }],
        )
        .unwrap();
    source.insert_rows(Table::Genotype, &genotypes()).unwrap();
    source
        .insert_rows(
            Table::AlleleGenotype,
            &[AlleleGenotypeRow {
                genotype_key: GenotypeKey(MUTANT_GENOTYPE),
                allele_id: "MGI:AL1".to_string(),
                allele_symbol: "Shh<tm1>".to_string(),
                marker_key: MarkerKey(SHH),
                marker_symbol: "Shh".to_string(),
            }],
        )
        .unwrap();
    source
        .insert_rows(
            Table::Reference,
            &[ReferenceRow {
                reference_key: ReferenceKey(900),
                jnum_id: "J:900".to_string(),
                short_citation: "Smith J, Dev 2001".to_string(),
                by_reference: 5,
            }],
        )
        .unwrap();
    source
        .insert_rows(
            Table::Assay,
            &[
                assay(1000, PAX6, Some(1)),
                assay(1001, SHH, Some(2)),
                assay(1002, BAD_COORDINATES, Some(1)),
                assay(1003, PAX6, None),
            ],
        )
        .unwrap();
    source.insert_rows(Table::ExpressionResult, &results()).unwrap();
    source
        .insert_rows(
            Table::ResultImage,
            &[
                ResultImageRow {
                    result_key: ResultKey(1),
                    figure_label: "Fig 1".to_string(),
                },
                ResultImageRow {
                    result_key: ResultKey(3),
                    figure_label: "Fig 2A".to_string(),
                },
            ],
        )
        .unwrap();
    source
        .insert_rows(
            Table::ResultCellType,
            &[ResultCellTypeRow {
                result_key: ResultKey(1),
                cell_type_id: "CL:1".to_string(),
                cell_type: "pyramidal neuron".to_string(),
                header: "neuron".to_string(),
            }],
        )
        .unwrap();
    source
        .insert_rows(
            Table::RnaSeqExperiment,
            &[ExperimentRow {
                experiment_key: ExperimentKey(700),
                experiment_id: "E-MTAB-700".to_string(),
                title: "Embryonic atlas".to_string(),
                reference_key: Some(ReferenceKey(900)),
            }],
        )
        .unwrap();
    source.insert_rows(Table::ConsolidatedSample, &samples()).unwrap();
    source.insert_rows(Table::RnaSeqMeasurement, &measurements()).unwrap();
    source
        .insert_rows(
            Table::ImagePane,
            &[
                pane(1, Some("5001"), "Fig 1", Some("A")),
                pane(2, None, "Fig 1", Some("B")),
                pane(3, Some("5003"), "Fig 3", None),
                pane(4, Some("5004"), "Fig 2", None),
            ],
        )
        .unwrap();
    source
        .insert_rows(
            Table::ResultImagePane,
            &[
                pane_result(3, 1, Some("3b"), None),
                pane_result(1, 1, Some("1a"), Some("section")),
                pane_result(2, 1, Some("2a"), Some("section")),
                pane_result(2, 2, Some("2a"), Some("section")),
                pane_result(3, 4, None, None),
            ],
        )
        .unwrap();
    source
}

fn pane(key: i64, pixeldb_id: Option<&str>, figure: &str, label: Option<&str>) -> ImagePaneRow {
    ImagePaneRow {
        imagepane_key: ImagePaneKey(key),
        image_id: format!("MGI:I{key}"),
        pixeldb_id: pixeldb_id.map(str::to_string),
        figure_label: figure.to_string(),
        pane_label: label.map(str::to_string),
        x: 10,
        y: 20,
        width: 100,
        height: 80,
        image_width: 400,
        image_height: 300,
        by_assay_type: key,
        by_marker: key + 10,
        by_hybridization_asc: key + 20,
        by_hybridization_desc: key + 30,
    }
}

fn pane_result(result: i64, pane: i64, specimen: Option<&str>, hybridization: Option<&str>) -> ResultImagePaneRow {
    ResultImagePaneRow {
        result_key: ResultKey(result),
        imagepane_key: ImagePaneKey(pane),
        specimen_label: specimen.map(str::to_string),
        hybridization: hybridization.map(str::to_string),
    }
}

fn markers() -> Vec<MarkerRow> {
    vec![
        marker(PAX6, "Pax6", 2, Some("105000"), Some("105692")),
        marker(SHH, "Shh", 3, None, None),
        marker(BAD_COORDINATES, "Bad1", 1, Some("abc"), Some("10")),
    ]
}

fn genotype(key: i64, is_wild_type: bool, alleles: Option<&str>, conditional: bool) -> GenotypeRow {
    GenotypeRow {
        genotype_key: GenotypeKey(key),
        primary_id: Some(format!("MGI:G{key}")),
        is_wild_type,
        allele_combination: alleles.map(str::to_string),
        background: is_wild_type.then(|| "C57BL/6J".to_string()),
        is_conditional: conditional,
    }
}

fn genotypes() -> Vec<GenotypeRow> {
    vec![
        genotype(WILD_TYPE_GENOTYPE, true, None, false),
        genotype(MUTANT_GENOTYPE, false, Some("Shh<tm1>/Shh<+>"), true),
    ]
}

fn results() -> Vec<ClassicalResultRow> {
    vec![
        result(1, 1000, "RNA in situ", PAX6, WILD_TYPE_GENOTYPE, FOREBRAIN_TS12, "Present", true),
        result(2, 1000, "RNA in situ", PAX6, WILD_TYPE_GENOTYPE, BRAIN_TS20, "Strong", false),
        result(3, 1001, "Immunohistochemistry", SHH, MUTANT_GENOTYPE, HEART_TS12, "Absent", true),
        result(4, 1002, "RNA in situ", BAD_COORDINATES, WILD_TYPE_GENOTYPE, BRAIN_TS12, "Present", false),
        result(5, 1003, "Recombinase reporter", PAX6, WILD_TYPE_GENOTYPE, HEART_TS12, "Present", true),
        result(6, 1001, "Immunohistochemistry", SHH, GenotypeKey::NONE.get(), HEART_TS20, "Ambiguous", false),
    ]
}

fn samples() -> Vec<ConsolidatedSampleRow> {
    vec![
        sample(800, WILD_TYPE_GENOTYPE, BRAIN_TS12, "Female", None),
        sample(801, MUTANT_GENOTYPE, HEART_TS12, "Male", Some("treated")),
    ]
}

fn measurements() -> Vec<RnaSeqMeasurementRow> {
    vec![
        measurement(1, 800, SHH, "High", 12.3456),
        measurement(2, 801, PAX6, "Below Cutoff", 0.1),
        measurement(3, 800, PAX6, "Medium", 5.0),
    ]
}

/// Expression fixture plus Sox2, whose specimens separate the wild-type
/// rules of classical results and RNA-seq samples
///
/// Classical results:
/// - 7: Sox2, flagged wild type with alleles, heart TS12, Present (counted)
/// - 8: Sox2, unflagged without alleles, brain TS20, Present (not counted)
///
/// RNA-seq measurements:
/// - 4: Sox2 in unflagged, allele-free heart TS20, High (counted)
/// - 5: Sox2 in flagged brain TS12 with alleles, High (not counted)
pub fn wild_type_source() -> MemoryFactSource {
    let mut source = expression_source();

    let mut markers = markers();
    markers.push(marker(SOX2, "Sox2", 4, None, None));
    source.insert_rows(Table::Marker, &markers).unwrap();

    let mut genotypes = genotypes();
    genotypes.push(genotype(FLAGGED_WITH_ALLELES_GENOTYPE, true, Some("Sox2<tm1>/Sox2<+>"), false));
    genotypes.push(genotype(UNFLAGGED_NO_ALLELES_GENOTYPE, false, None, false));
    source.insert_rows(Table::Genotype, &genotypes).unwrap();

    let mut results = results();
    results.push(result(7, 1004, "RNA in situ", SOX2, FLAGGED_WITH_ALLELES_GENOTYPE, HEART_TS12, "Present", false));
    results.push(result(8, 1004, "RNA in situ", SOX2, UNFLAGGED_NO_ALLELES_GENOTYPE, BRAIN_TS20, "Present", false));
    source.insert_rows(Table::ExpressionResult, &results).unwrap();

    let mut samples = samples();
    samples.push(sample(802, UNFLAGGED_NO_ALLELES_GENOTYPE, HEART_TS20, "Male", None));
    samples.push(sample(803, FLAGGED_WITH_ALLELES_GENOTYPE, BRAIN_TS12, "Female", None));
    source.insert_rows(Table::ConsolidatedSample, &samples).unwrap();

    let mut measurements = measurements();
    measurements.push(measurement(4, 802, SOX2, "High", 30.0));
    measurements.push(measurement(5, 803, SOX2, "High", 25.0));
    source.insert_rows(Table::RnaSeqMeasurement, &measurements).unwrap();
    source
}

/// Expression fixture in which Pax6 has no expression literature
pub fn unpublished_marker_source() -> MemoryFactSource {
    let mut source = expression_source();
    let mut markers = markers();
    for marker in markers.iter_mut().filter(|m| m.marker_key == MarkerKey(PAX6)) {
        marker.gxd_literature_count = 0;
    }
    source.insert_rows(Table::Marker, &markers).unwrap();
    source
}

/// Config with a uniform window size, a small buffer and no progress bars
pub fn test_config(chunk: i64) -> IndexerConfig {
    IndexerConfig {
        chunk_sizes: ChunkSizes::uniform(chunk),
        buffer_size: 2,
        max_threads: 2,
        liveness_interval_secs: 1,
        ..IndexerConfig::default()
    }
}

/// Context over an in-memory source and sink, with memory pressure never
/// reported
pub fn memory_context(
    source: MemoryFactSource,
    sinks: &MemorySinkFactory,
    config: IndexerConfig,
) -> JobContext {
    JobContext::new(config, Arc::new(source), Arc::new(sinks.clone()))
        .with_probes(Arc::new(|| Box::new(ScriptedMemoryProbe::constant(0.1)) as Box<dyn MemoryProbe>))
}

/// Find a document by its unique key
pub fn find<'a>(documents: &'a [Document], id: &str) -> &'a Document {
    documents
        .iter()
        .find(|d| d.id() == id)
        .unwrap_or_else(|| panic!("no document {id}"))
}

/// Unique keys of a collection, sorted
pub fn ids(documents: &[Document]) -> Vec<&str> {
    let mut ids: Vec<&str> = documents.iter().map(Document::id).collect();
    ids.sort_unstable();
    ids
}

/// Text list field as plain strings
pub fn list(document: &Document, field: &str) -> Vec<String> {
    document.list(field).iter().map(ToString::to_string).collect()
}
