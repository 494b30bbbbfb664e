//! Expansion of an annotated structure into its searchable fields.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::cache::{DedupTracker, MultiLookup, StringPool, load_term_synonyms};
use crate::error::Result;
use crate::model::rows::AnatomicalSystemRow;
use crate::model::{Document, Stage, TermKey, fields};
use crate::ontology::TermClosureIndex;
use crate::source::{FactSource, FactSourceExt, Table};

/// Searchable fields of one EMAPS structure
#[derive(Debug, Clone, PartialEq)]
pub struct StructureFields {
    pub emaps_key: TermKey,
    pub emaps_id: Arc<str>,
    pub emapa_key: TermKey,
    pub emapa_id: Arc<str>,
    pub name: Arc<str>,
    pub stage: Stage,
    /// EMAPA IDs of every stage-valid ancestor, sorted
    pub ancestor_ids: Vec<Arc<str>>,
    /// Synonyms of the structure and its ancestors, deduplicated
    pub synonyms: Vec<Arc<str>>,
    /// Anatomical systems the structure belongs to
    pub systems: Vec<Arc<str>>,
}

impl StructureFields {
    /// Write the structure fields into a document
    pub fn apply(&self, document: &mut Document) {
        document.set(fields::STRUCTURE_KEY, self.emaps_key.get());
        document.set(fields::STRUCTURE_EXACT, Arc::clone(&self.emaps_id));
        document.set(fields::EMAPA_ID, Arc::clone(&self.emapa_id));
        document.set(fields::STRUCTURE_NAME, Arc::clone(&self.name));
        document.set(fields::THEILER_STAGE, i64::from(self.stage.0));
        document.set_list(fields::STRUCTURE_ANCESTORS, self.ancestor_ids.clone());
        document.set_list(fields::STRUCTURE_SYNONYMS, self.synonyms.clone());
        document.set_list(fields::ANATOMICAL_SYSTEM, self.systems.clone());
    }
}

/// Builds and memoizes [`StructureFields`] per EMAPS term
#[derive(Debug)]
pub struct StructureExpander {
    synonyms: MultiLookup<TermKey, Arc<str>>,
    systems: MultiLookup<TermKey, Arc<str>>,
    expanded: FxHashMap<TermKey, Arc<StructureFields>>,
}

impl StructureExpander {
    /// Load the whole-dataset synonym and anatomical system caches
    pub fn load(source: &dyn FactSource) -> Result<Self> {
        let synonyms = load_term_synonyms(source)?;
        let mut pool = StringPool::new();
        let rows: Vec<AnatomicalSystemRow> = source.all_rows(Table::AnatomicalSystem)?;
        let mut systems = MultiLookup::new();
        for row in rows {
            systems.push_unique(row.emapa_key, pool.intern(&row.system));
        }
        Ok(Self::new(synonyms, systems))
    }

    #[must_use]
    pub fn new(
        synonyms: MultiLookup<TermKey, Arc<str>>,
        systems: MultiLookup<TermKey, Arc<str>>,
    ) -> Self {
        Self {
            synonyms,
            systems,
            expanded: FxHashMap::default(),
        }
    }

    /// Fields for an EMAPS structure
    ///
    /// Returns `None` when the structure is not a known EMAPS term.
    pub fn expand(
        &mut self,
        index: &TermClosureIndex,
        emaps: TermKey,
        tracker: &mut DedupTracker,
    ) -> Option<Arc<StructureFields>> {
        if let Some(cached) = self.expanded.get(&emaps) {
            return Some(Arc::clone(cached));
        }
        let ancestry = index.structure_ancestry(emaps).ok()?;
        let projection = ancestry.own;
        let emaps_term = index.term(emaps)?;
        let emapa_term = index.term(projection.emapa)?;
        let ancestor_ids = index.sorted_ids(&ancestry.emapa_ancestors);

        tracker.reset_field(fields::STRUCTURE_SYNONYMS);
        let mut synonyms = tracker.unseen(fields::STRUCTURE_SYNONYMS, self.synonyms.get(&projection.emapa));
        for ancestor in &ancestry.emapa_ancestors {
            synonyms.extend(tracker.unseen(fields::STRUCTURE_SYNONYMS, self.synonyms.get(ancestor)));
        }

        let expanded = Arc::new(StructureFields {
            emaps_key: emaps,
            emaps_id: Arc::clone(&emaps_term.id),
            emapa_key: projection.emapa,
            emapa_id: Arc::clone(&emapa_term.id),
            name: Arc::clone(&emapa_term.name),
            stage: projection.stage,
            ancestor_ids,
            synonyms,
            systems: self.systems.get(&projection.emapa).to_vec(),
        });
        self.expanded.insert(emaps, Arc::clone(&expanded));
        Some(expanded)
    }
}
