//! Row types for each fact table.
//!
//! Rows are deserialized from Arrow record batches with `serde_arrow`, so the
//! field names below are the column names expected in the fact tables.

use serde::{Deserialize, Serialize};

use super::ids::{
    AssayKey, ExperimentKey, GenotypeKey, ImagePaneKey, MarkerKey, MeasurementKey, ReferenceKey,
    ResultKey, SampleKey, Stage, TermKey,
};

/// A vocabulary term (`term` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRow {
    pub term_key: TermKey,
    pub term_id: String,
    pub term: String,
    pub vocab_name: String,
    pub is_obsolete: bool,
}

/// One row of the precomputed transitive closure (`dag_closure` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureEdgeRow {
    /// Unique key of the closure row upstream
    pub edge_key: i64,
    pub ancestor_key: TermKey,
    pub descendant_key: TermKey,
}

/// A direct parent to child edge (`dag_edge` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagEdgeRow {
    /// Unique key of the edge row upstream
    pub edge_key: i64,
    pub parent_key: TermKey,
    pub child_key: TermKey,
}

/// Projection of an EMAPS term onto its EMAPA term (`emaps_mapping` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmapsMappingRow {
    pub emaps_key: TermKey,
    pub emapa_key: TermKey,
    pub stage: Stage,
}

/// Valid stage range of an EMAPA term (`emapa_stage_range` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmapaStageRangeRow {
    pub emapa_key: TermKey,
    pub start_stage: Stage,
    pub end_stage: Stage,
}

/// Display synonym of a term (`term_synonym` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSynonymRow {
    pub term_key: TermKey,
    pub synonym: String,
}

/// Top-level anatomical system of an EMAPA term (`anatomical_system` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnatomicalSystemRow {
    pub emapa_key: TermKey,
    pub system: String,
}

/// A marker (`marker` table)
///
/// Coordinates are kept as text because the upstream column is free-form; a
/// value that does not parse makes the row unusable for assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRow {
    pub marker_key: MarkerKey,
    pub primary_id: String,
    pub symbol: String,
    pub name: String,
    pub marker_type: String,
    pub chromosome: Option<String>,
    pub cm_offset: Option<f64>,
    pub start_coordinate: Option<String>,
    pub end_coordinate: Option<String>,
    pub strand: Option<String>,
    pub by_symbol: i64,
    /// Number of references with expression data for the marker
    pub gxd_literature_count: i64,
}

/// Marker synonym (`marker_synonym` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSynonymRow {
    pub marker_key: MarkerKey,
    pub synonym: String,
}

/// Vocabulary annotation of a marker (`marker_annotation` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerAnnotationRow {
    pub marker_key: MarkerKey,
    pub vocab_name: String,
    pub term_id: String,
    pub term: String,
}

/// Ancestor of an annotation term (`vocab_ancestor` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabAncestorRow {
    pub term_id: String,
    pub ancestor_id: String,
    pub ancestor_term: String,
}

/// Header term of a marker-level facet (one table per facet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerHeaderRow {
    pub marker_key: MarkerKey,
    pub header: String,
}

/// A genotype (`genotype` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenotypeRow {
    pub genotype_key: GenotypeKey,
    pub primary_id: Option<String>,
    pub is_wild_type: bool,
    pub allele_combination: Option<String>,
    pub background: Option<String>,
    pub is_conditional: bool,
}

/// Allele carried by a genotype (`allele_genotype` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlleleGenotypeRow {
    pub genotype_key: GenotypeKey,
    pub allele_id: String,
    pub allele_symbol: String,
    pub marker_key: MarkerKey,
    pub marker_symbol: String,
}

/// A literature reference (`reference` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub reference_key: ReferenceKey,
    pub jnum_id: String,
    pub short_citation: String,
    pub by_reference: i64,
}

/// A classical expression assay (`assay` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssayRow {
    pub assay_key: AssayKey,
    pub assay_id: String,
    pub marker_key: MarkerKey,
    pub reference_key: ReferenceKey,
    pub probe_name: Option<String>,
    pub antibody_name: Option<String>,
    /// Display order of the assay type
    pub assay_type_seq: Option<i64>,
}

/// A classical expression result (`expression_result` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalResultRow {
    pub result_key: ResultKey,
    pub assay_key: AssayKey,
    pub assay_type: String,
    pub marker_key: MarkerKey,
    pub genotype_key: GenotypeKey,
    pub reference_key: ReferenceKey,
    pub emaps_key: TermKey,
    pub age_min: Option<f64>,
    pub age_max: Option<f64>,
    pub age_label: Option<String>,
    pub sex: Option<String>,
    pub detection_level: String,
    pub pattern: Option<String>,
    pub has_image: bool,
}

/// Figure label of an image attached to a result (`result_image` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultImageRow {
    pub result_key: ResultKey,
    pub figure_label: String,
}

/// Cell type annotated on a result (`result_cell_type` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCellTypeRow {
    pub result_key: ResultKey,
    pub cell_type_id: String,
    pub cell_type: String,
    pub header: String,
}

/// An RNA-seq experiment (`rnaseq_experiment` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRow {
    pub experiment_key: ExperimentKey,
    pub experiment_id: String,
    pub title: String,
    pub reference_key: Option<ReferenceKey>,
}

/// An RNA-seq consolidated sample (`consolidated_sample` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedSampleRow {
    pub sample_key: SampleKey,
    pub experiment_key: ExperimentKey,
    pub genotype_key: GenotypeKey,
    pub emaps_key: TermKey,
    pub age_min: Option<f64>,
    pub age_max: Option<f64>,
    pub age_label: Option<String>,
    pub sex: String,
    pub replicate_count: i32,
    pub note: Option<String>,
}

/// One marker measured in one consolidated sample (`rnaseq_measurement` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnaSeqMeasurementRow {
    pub measurement_key: MeasurementKey,
    pub sample_key: SampleKey,
    pub marker_key: MarkerKey,
    pub level: String,
    pub avg_qn_tpm: f64,
}

/// One pane of a figure image (`image_pane` table)
///
/// Panes without a pixel store ID have no image to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePaneRow {
    pub imagepane_key: ImagePaneKey,
    pub image_id: String,
    pub pixeldb_id: Option<String>,
    pub figure_label: String,
    pub pane_label: Option<String>,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub image_width: i64,
    pub image_height: i64,
    pub by_assay_type: i64,
    pub by_marker: i64,
    pub by_hybridization_asc: i64,
    pub by_hybridization_desc: i64,
}

/// A classical result shown in an image pane, with the specimen it was
/// observed in (`result_image_pane` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultImagePaneRow {
    pub result_key: ResultKey,
    pub imagepane_key: ImagePaneKey,
    pub specimen_label: Option<String>,
    pub hybridization: Option<String>,
}
