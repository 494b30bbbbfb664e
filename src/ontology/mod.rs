//! Ontology closure index for the EMAPA and EMAPS anatomy vocabularies.
//!
//! Stored ancestor and descendant sets are strict: a term is never its own
//! ancestor. Callers that need the reflexive closure use
//! [`TermClosureIndex::ancestors_inclusive`] or
//! [`TermClosureIndex::emapa_closure_of_emaps`], which add the term
//! explicitly.
//!
//! EMAPS ancestry is always walked inside the EMAPS DAG and only then
//! projected onto EMAPA, so a stage-specific path can never pick up an
//! ancestor that is not valid at that stage.

pub mod build;

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{IndexerError, Result};
use crate::model::{Stage, TermKey};

pub use build::ClosureBuilder;

/// Vocabulary a term belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    /// Stage-agnostic anatomy
    Emapa,
    /// Stage-specific anatomy
    Emaps,
    /// Any other vocabulary (cell types, annotation vocabularies)
    Other(Arc<str>),
}

impl Vocabulary {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "EMAPA" => Self::Emapa,
            "EMAPS" => Self::Emaps,
            other => Self::Other(Arc::from(other)),
        }
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emapa => f.write_str("EMAPA"),
            Self::Emaps => f.write_str("EMAPS"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Descriptive attributes of a term
#[derive(Debug, Clone, PartialEq)]
pub struct TermInfo {
    pub key: TermKey,
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub vocabulary: Vocabulary,
    pub obsolete: bool,
}

/// Stage-agnostic term and stage an EMAPS term corresponds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageProjection {
    pub emapa: TermKey,
    pub stage: Stage,
}

/// Inclusive stage range over which an EMAPA term exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRange {
    pub start: Stage,
    pub end: Stage,
}

impl StageRange {
    #[must_use]
    pub fn contains(&self, stage: Stage) -> bool {
        (self.start..=self.end).contains(&stage)
    }
}

/// Stage-valid ancestry of one EMAPS structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureAncestry {
    /// The structure's own EMAPA term and stage
    pub own: StageProjection,
    /// Strict EMAPS ancestors, in key order
    pub emaps_ancestors: Vec<TermKey>,
    /// EMAPA projections of those ancestors, excluding `own.emapa`, in key order
    pub emapa_ancestors: Vec<TermKey>,
}

/// Ancestor and descendant closures plus the EMAPS to EMAPA stage mapping
#[derive(Debug, Default)]
pub struct TermClosureIndex {
    terms: FxHashMap<TermKey, TermInfo>,
    ancestors: FxHashMap<TermKey, FxHashSet<TermKey>>,
    descendants: FxHashMap<TermKey, FxHashSet<TermKey>>,
    projections: FxHashMap<TermKey, StageProjection>,
    stage_ranges: FxHashMap<TermKey, StageRange>,
    edge_emaps: FxHashMap<(TermKey, TermKey), Vec<TermKey>>,
    empty: FxHashSet<TermKey>,
}

impl TermClosureIndex {
    /// Attributes of a term
    #[must_use]
    pub fn term(&self, key: TermKey) -> Option<&TermInfo> {
        self.terms.get(&key)
    }

    /// External ID of a term
    #[must_use]
    pub fn term_id(&self, key: TermKey) -> Option<&Arc<str>> {
        self.terms.get(&key).map(|t| &t.id)
    }

    /// Strict ancestors of a term; empty for unknown terms and roots
    #[must_use]
    pub fn ancestors_of(&self, key: TermKey) -> &FxHashSet<TermKey> {
        self.ancestors.get(&key).unwrap_or(&self.empty)
    }

    /// Strict descendants of a term; empty for unknown terms and leaves
    #[must_use]
    pub fn descendants_of(&self, key: TermKey) -> &FxHashSet<TermKey> {
        self.descendants.get(&key).unwrap_or(&self.empty)
    }

    /// Ancestors of a term together with the term itself
    #[must_use]
    pub fn ancestors_inclusive(&self, key: TermKey) -> FxHashSet<TermKey> {
        let mut closure = self.ancestors_of(key).clone();
        closure.insert(key);
        closure
    }

    /// EMAPA term and stage of an EMAPS term
    pub fn stage_projection(&self, emaps: TermKey) -> Result<StageProjection> {
        self.projections
            .get(&emaps)
            .copied()
            .ok_or(IndexerError::UnknownTerm(emaps))
    }

    /// Valid stage range of an EMAPA term
    #[must_use]
    pub fn stage_range(&self, emapa: TermKey) -> Option<StageRange> {
        self.stage_ranges.get(&emapa).copied()
    }

    /// EMAPS terms whose stage-specific ancestry links `descendant` to
    /// `ancestor` in the EMAPA DAG, in key order
    #[must_use]
    pub fn valid_emaps_for_edge(&self, ancestor: TermKey, descendant: TermKey) -> &[TermKey] {
        self.edge_emaps
            .get(&(ancestor, descendant))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// EMAPA closure of an EMAPS term: its own EMAPA term plus the EMAPA
    /// projection of every EMAPS ancestor
    pub fn emapa_closure_of_emaps(&self, emaps: TermKey) -> Result<FxHashSet<TermKey>> {
        let own = self.stage_projection(emaps)?;
        let mut closure = FxHashSet::default();
        closure.insert(own.emapa);
        for ancestor in self.ancestors_of(emaps) {
            if let Some(projection) = self.projections.get(ancestor) {
                closure.insert(projection.emapa);
            }
        }
        Ok(closure)
    }

    /// EMAPA projections of the strict EMAPS ancestors of an EMAPS term
    fn emapa_ancestors_of_emaps(&self, emaps: TermKey) -> FxHashSet<TermKey> {
        let own = self.projections.get(&emaps).map(|p| p.emapa);
        self.ancestors_of(emaps)
            .iter()
            .filter_map(|a| self.projections.get(a).map(|p| p.emapa))
            .filter(|emapa| Some(*emapa) != own)
            .collect()
    }

    /// EMAPS ancestors of a structure, their EMAPA projections and the
    /// structure's own EMAPA term
    pub fn structure_ancestry(&self, emaps: TermKey) -> Result<StructureAncestry> {
        let own = self.stage_projection(emaps)?;
        let mut emaps_ancestors: Vec<TermKey> = self.ancestors_of(emaps).iter().copied().collect();
        emaps_ancestors.sort_unstable();
        let mut emapa_ancestors: Vec<TermKey> = self.emapa_ancestors_of_emaps(emaps).into_iter().collect();
        emapa_ancestors.sort_unstable();
        Ok(StructureAncestry {
            own,
            emaps_ancestors,
            emapa_ancestors,
        })
    }

    /// Render keys as sorted, deduplicated external IDs
    #[must_use]
    pub fn sorted_ids<'a>(&self, keys: impl IntoIterator<Item = &'a TermKey>) -> Vec<Arc<str>> {
        let mut ids: Vec<Arc<str>> = keys
            .into_iter()
            .filter_map(|k| self.term_id(*k).cloned())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
