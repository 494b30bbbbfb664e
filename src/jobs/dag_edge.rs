//! `gxdDagEdge`: direct and descendant edges of the EMAPA DAG.
//!
//! Each document names an ancestor/descendant pair, both terms' valid stage
//! ranges and the EMAPS terms through which the pair is linked at a
//! specific stage. Direct edges also carry the parent's ancestors and the
//! child's descendants, so a lookup by either end finds the whole lineage.
//! Documents are keyed `{vocab}_{edge type}_{upstream edge key}`.

use std::fmt;
use std::sync::Arc;

use super::{IndexJob, JobContext};
use crate::assemble::SkipRow;
use crate::error::Result;
use crate::model::rows::{ClosureEdgeRow, DagEdgeRow};
use crate::model::{Document, TermKey, fields};
use crate::ontology::{TermClosureIndex, Vocabulary};
use crate::scan::{ChunkStrategy, ChunkedPipeline, KeyWindow, PipelineStats, WindowBounds};
use crate::source::{FactSource, FactSourceExt, Table};

pub const NAME: &str = "gxdDagEdge";

#[derive(Debug, Clone, Copy, Default)]
pub struct DagEdgeJob;

impl IndexJob for DagEdgeJob {
    fn name(&self) -> &'static str {
        NAME
    }

    fn collection(&self) -> &'static str {
        NAME
    }

    fn populate(
        &self,
        ctx: &JobContext,
        source: &dyn FactSource,
        pipeline: &mut ChunkedPipeline<'_>,
    ) -> Result<PipelineStats> {
        let index = ctx.closure_index(source)?;
        pipeline.run(&mut DagEdgeStrategy::new(&index, ctx.config.chunk_sizes.dag_edge))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Parent to child
    Direct,
    /// Any ancestor to any strict descendant
    Descendant,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Descendant => f.write_str("descendant"),
        }
    }
}

/// One EMAPA edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRow {
    pub kind: EdgeKind,
    pub edge_key: i64,
    pub ancestor: TermKey,
    pub descendant: TermKey,
}

/// Windows over descendant term keys
pub struct DagEdgeStrategy<'i> {
    index: &'i TermClosureIndex,
    chunk: i64,
}

impl<'i> DagEdgeStrategy<'i> {
    #[must_use]
    pub const fn new(index: &'i TermClosureIndex, chunk: i64) -> Self {
        Self { index, chunk }
    }

    fn is_emapa_pair(&self, ancestor: TermKey, descendant: TermKey) -> bool {
        ancestor != descendant
            && [ancestor, descendant].iter().all(|key| {
                self.index
                    .term(*key)
                    .is_some_and(|t| t.vocabulary == Vocabulary::Emapa)
            })
    }
}

impl ChunkStrategy for DagEdgeStrategy<'_> {
    type Row = EdgeRow;
    type Caches = ();

    fn name(&self) -> &str {
        "EMAPA edges"
    }

    fn window_bounds(&mut self, source: &dyn FactSource) -> Result<WindowBounds> {
        Ok(WindowBounds::from_zero(
            source.max_key(Table::Term, "term_key")?,
            self.chunk,
        ))
    }

    fn refresh_caches(&mut self, _source: &dyn FactSource, _window: KeyWindow) -> Result<()> {
        Ok(())
    }

    fn stream_rows(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Vec<EdgeRow>> {
        let mut rows = Vec::new();
        if source.has_table(Table::DagEdge) {
            let direct: Vec<DagEdgeRow> = source.range_rows(Table::DagEdge, "child_key", window)?;
            rows.extend(
                direct
                    .into_iter()
                    .filter(|r| self.is_emapa_pair(r.parent_key, r.child_key))
                    .map(|r| EdgeRow {
                        kind: EdgeKind::Direct,
                        edge_key: r.edge_key,
                        ancestor: r.parent_key,
                        descendant: r.child_key,
                    }),
            );
        }
        let closure: Vec<ClosureEdgeRow> =
            source.range_rows(Table::DagClosure, "descendant_key", window)?;
        rows.extend(
            closure
                .into_iter()
                .filter(|r| self.is_emapa_pair(r.ancestor_key, r.descendant_key))
                .map(|r| EdgeRow {
                    kind: EdgeKind::Descendant,
                    edge_key: r.edge_key,
                    ancestor: r.ancestor_key,
                    descendant: r.descendant_key,
                }),
        );
        Ok(rows)
    }

    fn assemble(&mut self, row: &EdgeRow, _caches: &()) -> std::result::Result<Document, SkipRow> {
        let label = format!("{} edge {}->{}", row.kind, row.ancestor, row.descendant);
        let (Some(ancestor), Some(descendant)) =
            (self.index.term(row.ancestor), self.index.term(row.descendant))
        else {
            return Err(SkipRow::new(label, "edge refers to an unknown term"));
        };

        let mut document = Document::new(edge_document_id(&ancestor.vocabulary, row.kind, row.edge_key));
        document.set(fields::EDGE_TYPE, row.kind.to_string());
        document.set(fields::VOCAB, ancestor.vocabulary.to_string());
        document.set(fields::ANCESTOR_KEY, row.ancestor.get());
        document.set(fields::DESCENDANT_KEY, row.descendant.get());
        document.set(fields::ANCESTOR_ID, Arc::clone(&ancestor.id));
        document.set(fields::ANCESTOR_TERM, Arc::clone(&ancestor.name));
        document.set(fields::DESCENDANT_ID, Arc::clone(&descendant.id));
        document.set(fields::DESCENDANT_TERM, Arc::clone(&descendant.name));
        if let Some(range) = self.index.stage_range(row.ancestor) {
            document.set(fields::ANCESTOR_START_STAGE, i64::from(range.start.0));
            document.set(fields::ANCESTOR_END_STAGE, i64::from(range.end.0));
        }
        if let Some(range) = self.index.stage_range(row.descendant) {
            document.set(fields::DESCENDANT_START_STAGE, i64::from(range.start.0));
            document.set(fields::DESCENDANT_END_STAGE, i64::from(range.end.0));
        }
        if row.kind == EdgeKind::Direct {
            document.set_list(
                fields::RELATED_ANCESTORS,
                self.index.sorted_ids(self.index.ancestors_of(row.ancestor)),
            );
            document.set_list(
                fields::RELATED_DESCENDANTS,
                self.index.sorted_ids(self.index.descendants_of(row.descendant)),
            );
        }
        document.set_list(
            fields::VALID_EMAPS_IDS,
            self.index
                .sorted_ids(self.index.valid_emaps_for_edge(row.ancestor, row.descendant)),
        );
        Ok(document)
    }
}

/// Unique key of an edge document
#[must_use]
pub fn edge_document_id(vocabulary: &Vocabulary, kind: EdgeKind, edge_key: i64) -> String {
    format!("{vocabulary}_{kind}_{edge_key}")
}
