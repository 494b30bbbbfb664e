//! Vocabulary annotations of markers, expanded with annotation ancestors.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{DedupTracker, MultiLookup, StringPool};
use crate::error::Result;
use crate::model::rows::{MarkerAnnotationRow, VocabAncestorRow};
use crate::model::{Document, MarkerKey, fields};
use crate::source::{FactSource, FactSourceExt, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
struct AnnotatedTerm {
    id: Arc<str>,
    term: Arc<str>,
}

/// Whole-dataset cache of marker annotations and their ancestor terms
#[derive(Debug, Default)]
pub struct MarkerAnnotations {
    annotations: MultiLookup<MarkerKey, AnnotatedTerm>,
    ancestors: FxHashMap<Arc<str>, Vec<AnnotatedTerm>>,
}

impl MarkerAnnotations {
    pub fn load(source: &dyn FactSource) -> Result<Self> {
        let mut pool = StringPool::new();
        let mut cache = Self::default();

        let rows: Vec<MarkerAnnotationRow> = source.all_rows(Table::MarkerAnnotation)?;
        for row in rows {
            cache.annotations.push_unique(
                row.marker_key,
                AnnotatedTerm {
                    id: pool.intern(&row.term_id),
                    term: pool.intern(&row.term),
                },
            );
        }

        let rows: Vec<VocabAncestorRow> = source.all_rows(Table::VocabAncestor)?;
        for row in rows {
            cache
                .ancestors
                .entry(pool.intern(&row.term_id))
                .or_default()
                .push(AnnotatedTerm {
                    id: pool.intern(&row.ancestor_id),
                    term: pool.intern(&row.ancestor_term),
                });
        }
        log::debug!(
            "Cached annotations for {} markers ({} distinct strings)",
            cache.annotations.len(),
            pool.distinct()
        );
        Ok(cache)
    }

    /// Add annotation IDs and terms, with their ancestors, to a document
    pub fn apply(&self, document: &mut Document, marker: MarkerKey, tracker: &mut DedupTracker) {
        tracker.reset_field(fields::ANNOTATION_IDS);
        tracker.reset_field(fields::ANNOTATION_TERMS);
        let mut ids = Vec::new();
        let mut terms = Vec::new();
        for annotation in self.annotations.get(&marker) {
            let ancestors = self.ancestors.get(&annotation.id).map(Vec::as_slice).unwrap_or_default();
            for term in std::iter::once(annotation).chain(ancestors) {
                if tracker.first_seen(fields::ANNOTATION_IDS, &term.id) {
                    ids.push(Arc::clone(&term.id));
                }
                if tracker.first_seen(fields::ANNOTATION_TERMS, &term.term) {
                    terms.push(Arc::clone(&term.term));
                }
            }
        }
        document.set_list(fields::ANNOTATION_IDS, ids);
        document.set_list(fields::ANNOTATION_TERMS, terms);
    }
}
