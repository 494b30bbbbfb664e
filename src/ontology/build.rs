//! Range-partitioned construction of the closure index.
//!
//! The closure table is read one window of descendant keys at a time. Each
//! window's partial ancestor and descendant maps, and the EMAPS to EMAPA edge
//! pairs derived from them, are merged into the index before the window's
//! rows are dropped.

use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{StageProjection, StageRange, TermClosureIndex, TermInfo, Vocabulary};
use crate::cache::StringPool;
use crate::error::{IndexerError, Result};
use crate::model::TermKey;
use crate::model::rows::{ClosureEdgeRow, DagEdgeRow, EmapaStageRangeRow, EmapsMappingRow, TermRow};
use crate::scan::WindowBounds;
use crate::source::{FactSource, FactSourceExt, Table};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Builds a [`TermClosureIndex`] from a fact source
#[derive(Debug, Clone)]
pub struct ClosureBuilder {
    chunk: i64,
}

#[derive(Debug, Default)]
struct BuildStats {
    windows: usize,
    closure_rows: usize,
    dropped_rows: usize,
    self_edges: usize,
}

impl ClosureBuilder {
    /// Builder reading `chunk` descendant keys per window
    #[must_use]
    pub const fn new(chunk: i64) -> Self {
        Self { chunk }
    }

    /// Build the index
    ///
    /// # Errors
    /// Fails when a required table cannot be read, when an EMAPS projection
    /// refers to an unknown term, or when a projected stage lies outside the
    /// EMAPA term's stage range.
    pub fn build(&self, source: &dyn FactSource) -> Result<TermClosureIndex> {
        let start = Instant::now();
        log_operation_start("Building closure index from", Table::DagClosure.name());

        let mut index = TermClosureIndex::default();
        load_terms(&mut index, source)?;
        load_stage_ranges(&mut index, source)?;
        load_projections(&mut index, source)?;
        let direct = if source.has_table(Table::DagEdge) {
            load_direct_edges(&index, source)?
        } else {
            Vec::new()
        };

        let bounds = WindowBounds::from_zero(
            source.max_key(Table::DagClosure, "descendant_key")?,
            self.chunk,
        );
        let mut stats = BuildStats::default();
        for window in bounds.plan()? {
            let rows: Vec<ClosureEdgeRow> =
                source.range_rows(Table::DagClosure, "descendant_key", window)?;
            stats.windows += 1;
            stats.closure_rows += rows.len();
            let partial = partial_closure(&index, rows, &mut stats);
            merge_partial(&mut index, partial);
            log::debug!(
                "Closure window {window}: {} ancestor sets so far",
                index.ancestors.len()
            );
        }

        if stats.dropped_rows > 0 {
            log_warning(
                &format!(
                    "dropped {} closure rows with unknown or cross-vocabulary terms",
                    stats.dropped_rows
                ),
                Some(Table::DagClosure.name()),
            );
        }
        if stats.self_edges > 0 {
            log::debug!("Ignored {} reflexive closure rows", stats.self_edges);
        }
        let unclosed = unclosed_edges(&index, &direct);
        if unclosed > 0 {
            log_warning(
                &format!("{unclosed} direct edges have no matching closure row"),
                Some(Table::DagClosure.name()),
            );
        }
        log_operation_complete(
            "indexed",
            Table::DagClosure.name(),
            stats.closure_rows,
            Some(start.elapsed()),
        );
        Ok(index)
    }
}

fn load_terms(index: &mut TermClosureIndex, source: &dyn FactSource) -> Result<()> {
    let mut pool = StringPool::new();
    let rows: Vec<TermRow> = source.all_rows(Table::Term)?;
    index.terms.reserve(rows.len());
    for row in rows {
        let info = TermInfo {
            key: row.term_key,
            id: pool.intern(&row.term_id),
            name: pool.intern(&row.term),
            vocabulary: Vocabulary::from_name(&row.vocab_name),
            obsolete: row.is_obsolete,
        };
        index.terms.insert(row.term_key, info);
    }
    Ok(())
}

fn load_stage_ranges(index: &mut TermClosureIndex, source: &dyn FactSource) -> Result<()> {
    let rows: Vec<EmapaStageRangeRow> = source.all_rows(Table::EmapaStageRange)?;
    for row in rows {
        if row.start_stage > row.end_stage {
            return Err(IndexerError::schema(
                Table::EmapaStageRange.name(),
                format!(
                    "term {} has start stage {} after end stage {}",
                    row.emapa_key, row.start_stage, row.end_stage
                ),
            ));
        }
        index.stage_ranges.insert(
            row.emapa_key,
            StageRange {
                start: row.start_stage,
                end: row.end_stage,
            },
        );
    }
    Ok(())
}

fn load_projections(index: &mut TermClosureIndex, source: &dyn FactSource) -> Result<()> {
    let rows: Vec<EmapsMappingRow> = source.all_rows(Table::EmapsMapping)?;
    for row in rows {
        if !index
            .terms
            .get(&row.emaps_key)
            .is_some_and(|t| t.vocabulary == Vocabulary::Emaps)
        {
            return Err(IndexerError::UnknownTerm(row.emaps_key));
        }
        let range = index
            .stage_ranges
            .get(&row.emapa_key)
            .copied()
            .ok_or(IndexerError::UnknownTerm(row.emapa_key))?;
        if !range.contains(row.stage) {
            return Err(IndexerError::StageOutOfRange {
                emaps: row.emaps_key,
                emapa: row.emapa_key,
                stage: row.stage,
                start: range.start,
                end: range.end,
            });
        }
        index.projections.insert(
            row.emaps_key,
            StageProjection {
                emapa: row.emapa_key,
                stage: row.stage,
            },
        );
    }
    Ok(())
}

/// `(parent, child)` pairs of the direct edges within one vocabulary
fn load_direct_edges(index: &TermClosureIndex, source: &dyn FactSource) -> Result<Vec<(TermKey, TermKey)>> {
    let rows: Vec<DagEdgeRow> = source.all_rows(Table::DagEdge)?;
    let mut dropped = 0usize;
    let mut edges = Vec::with_capacity(rows.len());
    for row in rows {
        if row.parent_key == row.child_key || !same_vocabulary(index, row.parent_key, row.child_key) {
            dropped += 1;
            continue;
        }
        edges.push((row.parent_key, row.child_key));
    }
    if dropped > 0 {
        log_warning(
            &format!("dropped {dropped} reflexive or cross-vocabulary edges"),
            Some(Table::DagEdge.name()),
        );
    }
    Ok(edges)
}

/// Direct edges whose parent is missing from the child's ancestor closure
fn unclosed_edges(index: &TermClosureIndex, edges: &[(TermKey, TermKey)]) -> usize {
    edges
        .iter()
        .filter(|(parent, child)| !index.ancestors_of(*child).contains(parent))
        .count()
}

fn same_vocabulary(index: &TermClosureIndex, a: TermKey, b: TermKey) -> bool {
    match (index.terms.get(&a), index.terms.get(&b)) {
        (Some(a), Some(b)) => a.vocabulary == b.vocabulary,
        _ => false,
    }
}

/// Closure maps and edge pairs derived from one window of the closure table
#[derive(Debug, Default)]
struct PartialClosure {
    ancestors: FxHashMap<TermKey, FxHashSet<TermKey>>,
    descendants: FxHashMap<TermKey, FxHashSet<TermKey>>,
    edge_emaps: FxHashMap<(TermKey, TermKey), FxHashSet<TermKey>>,
}

fn partial_closure(
    index: &TermClosureIndex,
    rows: Vec<ClosureEdgeRow>,
    stats: &mut BuildStats,
) -> PartialClosure {
    let mut partial = PartialClosure::default();
    for row in rows {
        if row.ancestor_key == row.descendant_key {
            stats.self_edges += 1;
            continue;
        }
        if !same_vocabulary(index, row.ancestor_key, row.descendant_key) {
            stats.dropped_rows += 1;
            continue;
        }
        partial
            .ancestors
            .entry(row.descendant_key)
            .or_default()
            .insert(row.ancestor_key);
        partial
            .descendants
            .entry(row.ancestor_key)
            .or_default()
            .insert(row.descendant_key);
    }

    // Every ancestor row of a descendant lives in that descendant's window,
    // so EMAPS ancestry for these descendants is complete here.
    for (emaps, ancestors) in &partial.ancestors {
        let Some(own) = index.projections.get(emaps) else {
            continue;
        };
        for ancestor in ancestors {
            if let Some(projected) = index.projections.get(ancestor) {
                if projected.emapa != own.emapa {
                    partial
                        .edge_emaps
                        .entry((projected.emapa, own.emapa))
                        .or_default()
                        .insert(*emaps);
                }
            }
        }
    }
    partial
}

fn merge_partial(index: &mut TermClosureIndex, partial: PartialClosure) {
    for (key, set) in partial.ancestors {
        index.ancestors.entry(key).or_default().extend(set);
    }
    for (key, set) in partial.descendants {
        index.descendants.entry(key).or_default().extend(set);
    }
    for (pair, emaps) in partial.edge_emaps {
        let merged = index.edge_emaps.entry(pair).or_default();
        merged.extend(emaps);
        merged.sort_unstable();
        merged.dedup();
    }
}
