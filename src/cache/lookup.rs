//! Keyed lookup caches and the loaders for shared dimension tables.

use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::StringPool;
use crate::error::Result;
use crate::model::rows::{
    AlleleGenotypeRow, GenotypeRow, MarkerRow, MarkerSynonymRow, ReferenceRow, TermSynonymRow,
};
use crate::model::{GenotypeKey, MarkerKey, ReferenceKey, TermKey};
use crate::source::{FactSource, FactSourceExt, Table};

/// Single-valued cache
#[derive(Debug, Clone)]
pub struct Lookup<K, V> {
    map: FxHashMap<K, V>,
}

impl<K, V> Default for Lookup<K, V> {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }
}

impl<K: Eq + Hash, V> Lookup<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }

    /// Cached value; absence means no data is available for the key
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for Lookup<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Multi-valued cache keeping values in insertion order
#[derive(Debug, Clone)]
pub struct MultiLookup<K, V> {
    map: FxHashMap<K, SmallVec<[V; 4]>>,
}

impl<K, V> Default for MultiLookup<K, V> {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }
}

impl<K: Eq + Hash, V: PartialEq> MultiLookup<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: K, value: V) {
        self.map.entry(key).or_default().push(value);
    }

    /// Append a value unless the key already holds an equal one
    pub fn push_unique(&mut self, key: K, value: V) {
        let values = self.map.entry(key).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// Cached values, empty when the key has none
    #[must_use]
    pub fn get(&self, key: &K) -> &[V] {
        self.map.get(key).map(SmallVec::as_slice).unwrap_or_default()
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Eq + Hash, V: PartialEq> FromIterator<(K, V)> for MultiLookup<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for (key, value) in iter {
            lookup.push(key, value);
        }
        lookup
    }
}

/// Cached marker attributes
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerInfo {
    pub id: Arc<str>,
    pub symbol: Arc<str>,
    pub name: Arc<str>,
    pub marker_type: Arc<str>,
    pub chromosome: Option<Arc<str>>,
    pub cm_offset: Option<f64>,
    pub start_coordinate: Option<Arc<str>>,
    pub end_coordinate: Option<Arc<str>>,
    pub strand: Option<Arc<str>>,
    pub by_symbol: i64,
    pub gxd_literature_count: i64,
}

/// Cached genotype attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenotypeInfo {
    pub is_wild_type: bool,
    pub allele_combination: Option<Arc<str>>,
    pub background: Option<Arc<str>>,
    pub is_conditional: bool,
}

/// Cached reference attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceInfo {
    pub jnum_id: Arc<str>,
    pub short_citation: Arc<str>,
    pub by_reference: i64,
}

/// Alleles and mutated genes of a genotype
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenotypeAlleles {
    pub allele_ids: Vec<Arc<str>>,
    pub mutated_in: Vec<Arc<str>>,
}

fn to_raw<K: Into<i64>>(keys: impl IntoIterator<Item = K>) -> impl Iterator<Item = i64> {
    keys.into_iter().map(Into::into)
}

/// Markers with the given keys
pub fn load_markers(
    source: &dyn FactSource,
    keys: impl IntoIterator<Item = MarkerKey>,
) -> Result<Lookup<MarkerKey, MarkerInfo>> {
    let rows: Vec<MarkerRow> = source.key_rows(Table::Marker, "marker_key", to_raw(keys))?;
    let mut pool = StringPool::new();
    Ok(rows
        .into_iter()
        .map(|row| {
            let info = MarkerInfo {
                id: pool.intern(&row.primary_id),
                symbol: pool.intern(&row.symbol),
                name: pool.intern(&row.name),
                marker_type: pool.intern(&row.marker_type),
                chromosome: pool.intern_opt(row.chromosome.as_deref()),
                cm_offset: row.cm_offset,
                start_coordinate: pool.intern_opt(row.start_coordinate.as_deref()),
                end_coordinate: pool.intern_opt(row.end_coordinate.as_deref()),
                strand: pool.intern_opt(row.strand.as_deref()),
                by_symbol: row.by_symbol,
                gxd_literature_count: row.gxd_literature_count,
            };
            (row.marker_key, info)
        })
        .collect())
}

/// Synonyms of the given markers
pub fn load_marker_synonyms(
    source: &dyn FactSource,
    keys: impl IntoIterator<Item = MarkerKey>,
) -> Result<MultiLookup<MarkerKey, Arc<str>>> {
    let rows: Vec<MarkerSynonymRow> =
        source.key_rows(Table::MarkerSynonym, "marker_key", to_raw(keys))?;
    let mut pool = StringPool::new();
    let mut lookup = MultiLookup::new();
    for row in rows {
        lookup.push_unique(row.marker_key, pool.intern(&row.synonym));
    }
    Ok(lookup)
}

/// Genotypes with the given keys; the no-genotype sentinel is never loaded
pub fn load_genotypes(
    source: &dyn FactSource,
    keys: impl IntoIterator<Item = GenotypeKey>,
) -> Result<Lookup<GenotypeKey, GenotypeInfo>> {
    let keys = keys.into_iter().filter(|k| !k.is_none());
    let rows: Vec<GenotypeRow> = source.key_rows(Table::Genotype, "genotype_key", to_raw(keys))?;
    let mut pool = StringPool::new();
    Ok(rows
        .into_iter()
        .map(|row| {
            let info = GenotypeInfo {
                is_wild_type: row.is_wild_type,
                allele_combination: pool.intern_opt(row.allele_combination.as_deref()),
                background: pool.intern_opt(row.background.as_deref()),
                is_conditional: row.is_conditional,
            };
            (row.genotype_key, info)
        })
        .collect())
}

/// Alleles and mutated genes for the given genotypes
pub fn load_genotype_alleles(
    source: &dyn FactSource,
    keys: impl IntoIterator<Item = GenotypeKey>,
) -> Result<Lookup<GenotypeKey, GenotypeAlleles>> {
    let keys = keys.into_iter().filter(|k| !k.is_none());
    let rows: Vec<AlleleGenotypeRow> =
        source.key_rows(Table::AlleleGenotype, "genotype_key", to_raw(keys))?;
    let mut pool = StringPool::new();
    let mut grouped: FxHashMap<GenotypeKey, GenotypeAlleles> = FxHashMap::default();
    for row in rows {
        let entry = grouped.entry(row.genotype_key).or_default();
        let allele = pool.intern(&row.allele_id);
        if !entry.allele_ids.contains(&allele) {
            entry.allele_ids.push(allele);
        }
        let gene = pool.intern(&row.marker_symbol);
        if !entry.mutated_in.contains(&gene) {
            entry.mutated_in.push(gene);
        }
    }
    Ok(grouped.into_iter().collect())
}

/// References with the given keys
pub fn load_references(
    source: &dyn FactSource,
    keys: impl IntoIterator<Item = ReferenceKey>,
) -> Result<Lookup<ReferenceKey, ReferenceInfo>> {
    let rows: Vec<ReferenceRow> =
        source.key_rows(Table::Reference, "reference_key", to_raw(keys))?;
    let mut pool = StringPool::new();
    Ok(rows
        .into_iter()
        .map(|row| {
            let info = ReferenceInfo {
                jnum_id: pool.intern(&row.jnum_id),
                short_citation: pool.intern(&row.short_citation),
                by_reference: row.by_reference,
            };
            (row.reference_key, info)
        })
        .collect())
}

/// Display synonyms of every term
pub fn load_term_synonyms(source: &dyn FactSource) -> Result<MultiLookup<TermKey, Arc<str>>> {
    let rows: Vec<TermSynonymRow> = source.all_rows(Table::TermSynonym)?;
    let mut pool = StringPool::new();
    let mut lookup = MultiLookup::new();
    for row in rows {
        lookup.push_unique(row.term_key, pool.intern(&row.synonym));
    }
    Ok(lookup)
}
