//! Optional marker-level facet caches.
//!
//! Facets only narrow search filtering, so a facet whose table cannot be read
//! is logged and left out of every document rather than failing the job.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{MultiLookup, StringPool};
use crate::error::{IndexerError, Result};
use crate::model::rows::{MarkerHeaderRow, ResultCellTypeRow};
use crate::model::{Document, MarkerKey, ResultKey};
use crate::source::{FactSource, FactSourceExt, Table};

/// Header facets available for markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Phenotype,
    GoProcess,
    GoComponent,
    GoFunction,
    Disease,
}

impl Facet {
    pub const ALL: [Self; 5] = [
        Self::Phenotype,
        Self::GoProcess,
        Self::GoComponent,
        Self::GoFunction,
        Self::Disease,
    ];

    #[must_use]
    pub const fn table(self) -> Table {
        match self {
            Self::Phenotype => Table::MarkerMpHeader,
            Self::GoProcess => Table::MarkerGoBpHeader,
            Self::GoComponent => Table::MarkerGoCcHeader,
            Self::GoFunction => Table::MarkerGoMfHeader,
            Self::Disease => Table::MarkerDoHeader,
        }
    }

    /// Output field carrying the facet's headers
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Phenotype => "mp_header",
            Self::GoProcess => "go_bp_header",
            Self::GoComponent => "go_cc_header",
            Self::GoFunction => "go_mf_header",
            Self::Disease => "do_header",
        }
    }
}

type HeaderLookup = MultiLookup<MarkerKey, Arc<str>>;

/// Marker facets that could be loaded, plus the ones that could not
#[derive(Debug, Default)]
pub struct FacetCaches {
    available: FxHashMap<Facet, HeaderLookup>,
    unavailable: Vec<(Facet, String)>,
}

impl FacetCaches {
    /// Load every facet, degrading individually on failure
    pub fn load(source: &dyn FactSource) -> Self {
        Self::from_results(Facet::ALL.map(|facet| (facet, load_headers(source, facet))))
    }

    /// Assemble from per-facet build results
    pub fn from_results(results: impl IntoIterator<Item = (Facet, Result<HeaderLookup>)>) -> Self {
        let mut caches = Self::default();
        for (facet, result) in results {
            match result {
                Ok(lookup) => {
                    log::debug!("Loaded {} headers for {} markers", facet.field(), lookup.len());
                    caches.available.insert(facet, lookup);
                }
                Err(e) => {
                    log::error!(
                        "Facet {} unavailable, omitting it from documents: {e}",
                        facet.field()
                    );
                    caches.unavailable.push((facet, e.to_string()));
                }
            }
        }
        caches
    }

    #[must_use]
    pub fn is_available(&self, facet: Facet) -> bool {
        self.available.contains_key(&facet)
    }

    /// Facets that failed to load, with the reason
    #[must_use]
    pub fn unavailable(&self) -> &[(Facet, String)] {
        &self.unavailable
    }

    /// Headers of a marker for a facet; empty when the facet is unavailable
    #[must_use]
    pub fn headers(&self, facet: Facet, marker: MarkerKey) -> &[Arc<str>] {
        self.available
            .get(&facet)
            .map(|lookup| lookup.get(&marker))
            .unwrap_or_default()
    }

    /// Add every available facet of a marker to a document
    pub fn apply(&self, document: &mut Document, marker: MarkerKey) {
        for facet in Facet::ALL {
            document.set_list(facet.field(), self.headers(facet, marker).to_vec());
        }
    }
}

fn load_headers(source: &dyn FactSource, facet: Facet) -> Result<HeaderLookup> {
    let table = facet.table();
    if !source.has_table(table) {
        return Err(IndexerError::MissingTable(table.name().to_string()));
    }
    let rows: Vec<MarkerHeaderRow> = source.all_rows(table)?;
    let mut pool = StringPool::new();
    let mut lookup = MultiLookup::new();
    for row in rows {
        lookup.push_unique(row.marker_key, pool.intern(&row.header));
    }
    Ok(lookup)
}

/// Cell type IDs, names and headers per result
#[derive(Debug, Default)]
pub struct CellTypeCache {
    ids: MultiLookup<ResultKey, Arc<str>>,
    names: MultiLookup<ResultKey, Arc<str>>,
    headers: MultiLookup<ResultKey, Arc<str>>,
}

impl CellTypeCache {
    /// Cell types for the given results
    pub fn load(source: &dyn FactSource, results: impl IntoIterator<Item = ResultKey>) -> Result<Self> {
        let table = Table::ResultCellType;
        if !source.has_table(table) {
            return Err(IndexerError::MissingTable(table.name().to_string()));
        }
        let rows: Vec<ResultCellTypeRow> =
            source.key_rows(table, "result_key", results.into_iter().map(i64::from))?;
        let mut pool = StringPool::new();
        let mut cache = Self::default();
        for row in rows {
            cache.ids.push_unique(row.result_key, pool.intern(&row.cell_type_id));
            cache.names.push_unique(row.result_key, pool.intern(&row.cell_type));
            cache.headers.push_unique(row.result_key, pool.intern(&row.header));
        }
        Ok(cache)
    }

    #[must_use]
    pub fn ids(&self, result: ResultKey) -> &[Arc<str>] {
        self.ids.get(&result)
    }

    #[must_use]
    pub fn names(&self, result: ResultKey) -> &[Arc<str>] {
        self.names.get(&result)
    }

    #[must_use]
    pub fn headers(&self, result: ResultKey) -> &[Arc<str>] {
        self.headers.get(&result)
    }
}
