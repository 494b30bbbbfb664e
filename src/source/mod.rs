//! Fact sources.
//!
//! A [`FactSource`] exposes the tables the jobs read from as Arrow record
//! batches. Only two access patterns are needed: range-filtered scans over a
//! monotonic key column (`key > start and key <= end`) and key-set lookups for
//! dimension tables. [`FactSourceExt`] layers typed row access on top.

pub mod batch;
pub mod memory;
pub mod parquet;

use std::fmt;

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::scan::KeyWindow;

pub use memory::MemoryFactSource;
pub use parquet::ParquetFactSource;

/// Tables a fact source may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Term,
    DagClosure,
    DagEdge,
    EmapsMapping,
    EmapaStageRange,
    TermSynonym,
    AnatomicalSystem,
    Marker,
    MarkerSynonym,
    MarkerAnnotation,
    VocabAncestor,
    MarkerMpHeader,
    MarkerGoBpHeader,
    MarkerGoCcHeader,
    MarkerGoMfHeader,
    MarkerDoHeader,
    Genotype,
    AlleleGenotype,
    Reference,
    Assay,
    ExpressionResult,
    ResultImage,
    ResultCellType,
    RnaSeqExperiment,
    ConsolidatedSample,
    RnaSeqMeasurement,
    ImagePane,
    ResultImagePane,
}

impl Table {
    /// Every table, in declaration order
    pub const ALL: [Self; 28] = [
        Self::Term,
        Self::DagClosure,
        Self::DagEdge,
        Self::EmapsMapping,
        Self::EmapaStageRange,
        Self::TermSynonym,
        Self::AnatomicalSystem,
        Self::Marker,
        Self::MarkerSynonym,
        Self::MarkerAnnotation,
        Self::VocabAncestor,
        Self::MarkerMpHeader,
        Self::MarkerGoBpHeader,
        Self::MarkerGoCcHeader,
        Self::MarkerGoMfHeader,
        Self::MarkerDoHeader,
        Self::Genotype,
        Self::AlleleGenotype,
        Self::Reference,
        Self::Assay,
        Self::ExpressionResult,
        Self::ResultImage,
        Self::ResultCellType,
        Self::RnaSeqExperiment,
        Self::ConsolidatedSample,
        Self::RnaSeqMeasurement,
        Self::ImagePane,
        Self::ResultImagePane,
    ];

    /// Table name, also used as the Parquet file stem
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Term => "term",
            Self::DagClosure => "dag_closure",
            Self::DagEdge => "dag_edge",
            Self::EmapsMapping => "emaps_mapping",
            Self::EmapaStageRange => "emapa_stage_range",
            Self::TermSynonym => "term_synonym",
            Self::AnatomicalSystem => "anatomical_system",
            Self::Marker => "marker",
            Self::MarkerSynonym => "marker_synonym",
            Self::MarkerAnnotation => "marker_annotation",
            Self::VocabAncestor => "vocab_ancestor",
            Self::MarkerMpHeader => "marker_mp_header",
            Self::MarkerGoBpHeader => "marker_go_bp_header",
            Self::MarkerGoCcHeader => "marker_go_cc_header",
            Self::MarkerGoMfHeader => "marker_go_mf_header",
            Self::MarkerDoHeader => "marker_do_header",
            Self::Genotype => "genotype",
            Self::AlleleGenotype => "allele_genotype",
            Self::Reference => "reference",
            Self::Assay => "assay",
            Self::ExpressionResult => "expression_result",
            Self::ResultImage => "result_image",
            Self::ResultCellType => "result_cell_type",
            Self::RnaSeqExperiment => "rnaseq_experiment",
            Self::ConsolidatedSample => "consolidated_sample",
            Self::RnaSeqMeasurement => "rnaseq_measurement",
            Self::ImagePane => "image_pane",
            Self::ResultImagePane => "result_image_pane",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tabular store the jobs read facts from
///
/// Implementations must be usable from a single job thread; each job opens
/// its own source.
pub trait FactSource: Send {
    /// Whether the table can be read at all
    fn has_table(&self, table: Table) -> bool;

    /// Largest value of an integer key column, `None` for an empty table
    fn max_key(&self, table: Table, column: &str) -> Result<Option<i64>>;

    /// Rows whose `column` value lies in `(window.start, window.end]`
    fn scan_range(&self, table: Table, column: &str, window: KeyWindow)
    -> Result<Vec<RecordBatch>>;

    /// Rows whose `column` value is one of `keys`
    fn scan_keys(&self, table: Table, column: &str, keys: &FxHashSet<i64>)
    -> Result<Vec<RecordBatch>>;

    /// Every row of the table
    fn scan_all(&self, table: Table) -> Result<Vec<RecordBatch>>;
}

/// Typed row access for any [`FactSource`]
pub trait FactSourceExt: FactSource {
    /// Range scan deserialized into row structs
    fn range_rows<T: DeserializeOwned>(
        &self,
        table: Table,
        column: &str,
        window: KeyWindow,
    ) -> Result<Vec<T>> {
        batch::rows_from_batches(table, &self.scan_range(table, column, window)?)
    }

    /// Key-set scan deserialized into row structs
    fn key_rows<T, K>(&self, table: Table, column: &str, keys: K) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        K: IntoIterator<Item = i64>,
    {
        let keys: FxHashSet<i64> = keys.into_iter().collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        batch::rows_from_batches(table, &self.scan_keys(table, column, &keys)?)
    }

    /// Full scan deserialized into row structs
    fn all_rows<T: DeserializeOwned>(&self, table: Table) -> Result<Vec<T>> {
        batch::rows_from_batches(table, &self.scan_all(table)?)
    }
}

impl<S: FactSource + ?Sized> FactSourceExt for S {}

/// Opens an independent fact source for each job
pub trait SourceFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn FactSource>>;
}
