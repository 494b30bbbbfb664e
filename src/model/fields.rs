//! Output field names shared by the document assemblers.

// Result identity
pub const RESULT_KEY: &str = "result_key";
pub const ASSAY_KEY: &str = "assay_key";
pub const ASSAY_ID: &str = "assay_id";
pub const ASSAY_TYPE: &str = "assay_type";
pub const PROBE: &str = "probe";
pub const ANTIBODY: &str = "antibody";
pub const FIGURE_LABELS: &str = "figure_labels";
pub const PATTERN: &str = "pattern";
pub const RESULT_NOTE: &str = "result_note";

// Marker
pub const MARKER_KEY: &str = "marker_key";
pub const MARKER_ID: &str = "marker_id";
pub const MARKER_SYMBOL: &str = "marker_symbol";
pub const MARKER_NAME: &str = "marker_name";
pub const MARKER_TYPE: &str = "marker_type";
pub const MARKER_SYNONYMS: &str = "marker_synonyms";
pub const CHROMOSOME: &str = "chromosome";
pub const CM_OFFSET: &str = "cm_offset";
pub const START_COORDINATE: &str = "start_coordinate";
pub const END_COORDINATE: &str = "end_coordinate";
pub const STRAND: &str = "strand";
pub const GENOMIC_LOCATION: &str = "genomic_location";
pub const ANNOTATION_IDS: &str = "annotation_ids";
pub const ANNOTATION_TERMS: &str = "annotation_terms";

// Structure
pub const STRUCTURE_KEY: &str = "structure_key";
pub const STRUCTURE_EXACT: &str = "structure_exact";
pub const STRUCTURE_NAME: &str = "structure_name";
pub const EMAPA_ID: &str = "emapa_id";
pub const THEILER_STAGE: &str = "theiler_stage";
pub const STRUCTURE_ANCESTORS: &str = "structure_ancestor_ids";
pub const STRUCTURE_SYNONYMS: &str = "structure_synonyms";
pub const ANATOMICAL_SYSTEM: &str = "anatomical_system";

// Expression call
pub const AGE: &str = "age";
pub const AGE_MIN: &str = "age_min";
pub const AGE_MAX: &str = "age_max";
pub const AGE_BINS: &str = "age_bins";
pub const SEX: &str = "sex";
pub const DETECTION_LEVEL: &str = "detection_level";
pub const IS_EXPRESSED: &str = "is_expressed";
pub const STAGE_MATRIX_GROUP: &str = "stage_matrix_group";
pub const GENE_MATRIX_GROUP: &str = "gene_matrix_group";

// Genotype
pub const GENOTYPE_KEY: &str = "genotype_key";
pub const ALLELE_PAIRS: &str = "allele_pairs";
pub const IS_WILD_TYPE: &str = "is_wild_type";
pub const MUTATED_IN: &str = "mutated_in";
pub const ALLELE_IDS: &str = "allele_ids";
pub const STRAIN: &str = "strain";

// Reference
pub const JNUM_ID: &str = "jnum_id";
pub const SHORT_CITATION: &str = "short_citation";

// Sorting
pub const BY_SYMBOL: &str = "by_symbol";
pub const BY_REFERENCE: &str = "by_reference";
pub const A_BY_SYMBOL: &str = "a_by_symbol";
pub const BY_MUTANT_ALLELES: &str = "by_mutant_alleles";

// RNA-seq
pub const SAMPLE_KEY: &str = "sample_key";
pub const EXPERIMENT_ID: &str = "experiment_id";
pub const EXPERIMENT_TITLE: &str = "experiment_title";
pub const TPM_LEVEL: &str = "tpm_level";
pub const AVG_QN_TPM: &str = "avg_qn_tpm";
pub const REPLICATE_COUNT: &str = "bio_replicate_count";

// Cell types
pub const CELL_TYPE: &str = "cell_type";
pub const CELL_TYPE_ID: &str = "cell_type_id";
pub const CELL_TYPE_HEADER: &str = "cell_type_header";

// DAG edges
pub const EDGE_TYPE: &str = "edge_type";
pub const VOCAB: &str = "vocab";
pub const ANCESTOR_KEY: &str = "ancestor_term_key";
pub const DESCENDANT_KEY: &str = "descendant_term_key";
pub const RELATED_ANCESTORS: &str = "related_ancestor";
pub const RELATED_DESCENDANTS: &str = "related_descendant";
pub const ANCESTOR_ID: &str = "ancestor_id";
pub const ANCESTOR_TERM: &str = "ancestor_term";
pub const DESCENDANT_ID: &str = "descendant_id";
pub const DESCENDANT_TERM: &str = "descendant_term";
pub const ANCESTOR_START_STAGE: &str = "ancestor_start_stage";
pub const ANCESTOR_END_STAGE: &str = "ancestor_end_stage";
pub const DESCENDANT_START_STAGE: &str = "descendant_start_stage";
pub const DESCENDANT_END_STAGE: &str = "descendant_end_stage";
pub const VALID_EMAPS_IDS: &str = "valid_emaps_ids";

// Differential
pub const EXCLUSIVE_ANY_STAGE: &str = "exclusive_structures_any_stage";
pub const EXCLUSIVE_ALL_STAGES: &str = "exclusive_structures_all_stages";
pub const EXCLUSIVE_STRUCTURES: &str = "exclusive_structures";
pub const EXCLUSIVE_STAGES: &str = "exclusive_stages";
pub const POSITIVE_ANCESTORS: &str = "positive_ancestors";

// Profile
pub const POS_C_EMAPS_EXACT: &str = "pos_c_emaps_exact";
pub const POS_C_EMAPS_ANC: &str = "pos_c_emaps_anc";
pub const POS_C_EMAPA_EXACT: &str = "pos_c_emapa_exact";
pub const POS_C_EMAPA_ANC: &str = "pos_c_emapa_anc";
pub const POS_R_EMAPS_EXACT: &str = "pos_r_emaps_exact";
pub const POS_R_EMAPS_ANC: &str = "pos_r_emaps_anc";
pub const POS_R_EMAPA_EXACT: &str = "pos_r_emapa_exact";
pub const POS_R_EMAPA_ANC: &str = "pos_r_emapa_anc";

// Image panes
pub const IMAGE_PANE_KEY: &str = "imagepane_key";
pub const IMAGE_ID: &str = "image_id";
pub const PIXELDB_ID: &str = "pixeldb_id";
pub const IMAGE_LABEL: &str = "image_label";
pub const IMAGE_WIDTH: &str = "image_width";
pub const IMAGE_HEIGHT: &str = "image_height";
pub const PANE_WIDTH: &str = "pane_width";
pub const PANE_HEIGHT: &str = "pane_height";
pub const PANE_X: &str = "pane_x";
pub const PANE_Y: &str = "pane_y";
pub const IMAGE_META: &str = "image_meta";
pub const BY_ASSAY_TYPE: &str = "by_assay_type";
pub const BY_MARKER: &str = "by_marker";
pub const BY_HYBRIDIZATION_ASC: &str = "by_hybridization_asc";
pub const BY_HYBRIDIZATION_DESC: &str = "by_hybridization_desc";
