//! Per-marker exclusivity.
//!
//! For each stage with positive expression, the exclusive structures are the
//! intersection of the reflexive EMAPA closures of every positively
//! annotated structure in that stage. A structure is exclusive in all stages
//! only when it is exclusive, by identical term, in every positive stage.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::model::{Document, Stage, TermKey, fields};
use crate::ontology::TermClosureIndex;

/// Lifecycle of a marker's exclusivity state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusivityPhase {
    /// No positive result seen yet
    NoData,
    /// At least one positive result folded in
    Accumulating,
}

/// Running exclusivity state for one marker
#[derive(Debug, Default)]
pub struct MarkerExclusivity {
    stages: BTreeMap<Stage, FxHashSet<TermKey>>,
    cross_stage: Option<FxHashSet<TermKey>>,
    positive_ancestors: BTreeSet<(Stage, TermKey)>,
}

impl MarkerExclusivity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> ExclusivityPhase {
        if self.stages.is_empty() {
            ExclusivityPhase::NoData
        } else {
            ExclusivityPhase::Accumulating
        }
    }

    /// Fold in a positive result given its stage and reflexive closure
    pub fn observe(&mut self, stage: Stage, closure: &FxHashSet<TermKey>) {
        match self.stages.get_mut(&stage) {
            Some(running) => running.retain(|key| closure.contains(key)),
            None => {
                self.stages.insert(stage, closure.clone());
            }
        }
        match self.cross_stage.as_mut() {
            Some(running) => running.retain(|key| closure.contains(key)),
            None => self.cross_stage = Some(closure.clone()),
        }
        self.positive_ancestors
            .extend(closure.iter().map(|key| (stage, *key)));
    }

    /// Fold in a positive result annotated to an EMAPS structure
    pub fn observe_structure(&mut self, index: &TermClosureIndex, emaps: TermKey) -> Result<()> {
        let projection = index.stage_projection(emaps)?;
        let closure = index.emapa_closure_of_emaps(emaps)?;
        self.observe(projection.stage, &closure);
        Ok(())
    }

    /// Freeze the state once every result of the marker has been seen
    #[must_use]
    pub fn finalize(self) -> ExclusivitySummary {
        ExclusivitySummary {
            per_stage: self
                .stages
                .into_iter()
                .map(|(stage, set)| (stage, set.into_iter().collect()))
                .collect(),
            cross_stage: self.cross_stage.unwrap_or_default().into_iter().collect(),
            positive_ancestors: self.positive_ancestors,
        }
    }
}

/// Finalized, read-only exclusivity of one marker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusivitySummary {
    per_stage: BTreeMap<Stage, BTreeSet<TermKey>>,
    cross_stage: BTreeSet<TermKey>,
    positive_ancestors: BTreeSet<(Stage, TermKey)>,
}

impl ExclusivitySummary {
    /// Exclusive structures within one stage
    #[must_use]
    pub fn per_stage(&self, stage: Stage) -> Option<&BTreeSet<TermKey>> {
        self.per_stage.get(&stage)
    }

    /// Union of every stage's exclusive structures, as stage/term pairs
    #[must_use]
    pub fn any_stage(&self) -> BTreeSet<(Stage, TermKey)> {
        self.per_stage
            .iter()
            .flat_map(|(stage, set)| set.iter().map(move |key| (*stage, *key)))
            .collect()
    }

    /// Structures exclusive in every stage that has positive expression
    ///
    /// Counts, per structure, the stages it is exclusive in and keeps those
    /// whose count equals the number of positive stages.
    #[must_use]
    pub fn all_stages(&self) -> BTreeSet<TermKey> {
        let stage_count = self.per_stage.len();
        if stage_count == 0 {
            return BTreeSet::new();
        }
        let mut counts: BTreeMap<TermKey, usize> = BTreeMap::new();
        for set in self.per_stage.values() {
            for key in set {
                *counts.entry(*key).or_default() += 1;
            }
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count == stage_count)
            .map(|(key, _)| key)
            .collect()
    }

    /// Structures shared by the closures of every positive result, regardless
    /// of stage
    #[must_use]
    pub fn cross_stage(&self) -> &BTreeSet<TermKey> {
        &self.cross_stage
    }

    /// Stages with any positive expression
    #[must_use]
    pub fn exclusive_stages(&self) -> Vec<Stage> {
        self.per_stage.keys().copied().collect()
    }

    /// Every closure member of every positive result, as stage/term pairs
    #[must_use]
    pub fn positive_ancestors(&self) -> &BTreeSet<(Stage, TermKey)> {
        &self.positive_ancestors
    }

    /// Write the exclusivity fields into a document
    pub fn apply(&self, document: &mut Document, index: &TermClosureIndex) {
        document.set_list(fields::EXCLUSIVE_ANY_STAGE, render_staged(index, &self.any_stage()));
        document.set_list(fields::EXCLUSIVE_ALL_STAGES, index.sorted_ids(&self.all_stages()));
        document.set_list(fields::EXCLUSIVE_STRUCTURES, index.sorted_ids(&self.cross_stage));
        document.set_list(
            fields::POSITIVE_ANCESTORS,
            render_staged(index, &self.positive_ancestors),
        );
        let stages: Vec<i64> = self
            .exclusive_stages()
            .into_iter()
            .map(|s| i64::from(s.0))
            .collect();
        if !stages.is_empty() {
            document.set(fields::EXCLUSIVE_STAGES, stages);
        }
    }
}

/// Render a stage/term pair as `TS{stage}:{term id}`
#[must_use]
pub fn stage_term_label(stage: Stage, term_id: &str) -> String {
    format!("TS{stage}:{term_id}")
}

fn render_staged(index: &TermClosureIndex, pairs: &BTreeSet<(Stage, TermKey)>) -> Vec<Arc<str>> {
    let mut labels: Vec<Arc<str>> = pairs
        .iter()
        .filter_map(|(stage, key)| {
            index
                .term_id(*key)
                .map(|id| Arc::from(stage_term_label(*stage, id)))
        })
        .collect();
    labels.sort_unstable();
    labels
}
