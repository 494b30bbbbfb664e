//! `gxdImagePane`: one document per image pane showing classical results.
//!
//! Panes are windowed by key. A pane is indexed only when it has a pixel
//! store image and at least one result; the results are grouped into
//! marker / assay type / hybridization summaries that travel with the
//! document as JSON.

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use super::{IndexJob, JobContext};
use crate::assemble::SkipRow;
use crate::cache::{Lookup, MultiLookup, load_markers};
use crate::error::Result;
use crate::model::rows::{AssayRow, ClassicalResultRow, ImagePaneRow, ResultImagePaneRow};
use crate::model::{AssayKey, Document, ImagePaneKey, MarkerKey, ResultKey, fields};
use crate::scan::{ChunkStrategy, ChunkedPipeline, KeyWindow, PipelineStats, WindowBounds};
use crate::source::{FactSource, FactSourceExt, Table};

pub const NAME: &str = "gxdImagePane";

/// Sort position of assay types with no known order
pub const UNKNOWN_ASSAY_TYPE_SEQ: i64 = 99;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePaneJob;

impl IndexJob for ImagePaneJob {
    fn name(&self) -> &'static str {
        NAME
    }

    fn collection(&self) -> &'static str {
        NAME
    }

    fn populate(
        &self,
        ctx: &JobContext,
        _source: &dyn FactSource,
        pipeline: &mut ChunkedPipeline<'_>,
    ) -> Result<PipelineStats> {
        pipeline.run(&mut ImagePaneStrategy::new(ctx.config.chunk_sizes.image_pane))
    }
}

/// Specimen a result was observed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecimenLabel {
    pub label: String,
    pub assay_id: Arc<str>,
}

/// Results of one marker, assay type and hybridization shown in a pane
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    pub marker_symbol: Arc<str>,
    pub assay_type: String,
    pub hybridization: Option<String>,
    pub specimen_labels: Vec<SpecimenLabel>,
    #[serde(skip)]
    assay_type_seq: i64,
}

impl ImageMeta {
    fn matches(&self, symbol: &str, assay_type: &str, hybridization: Option<&str>) -> bool {
        &*self.marker_symbol == symbol
            && self.assay_type == assay_type
            && self.hybridization.as_deref() == hybridization
    }
}

/// Compare strings case-insensitively, ordering embedded numbers by value
#[must_use]
pub fn smart_alpha_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let take_number = |chars: &mut std::iter::Peekable<std::str::Chars<'_>>| {
                    let mut digits = String::new();
                    while let Some(c) = chars.next_if(char::is_ascii_digit) {
                        digits.push(c);
                    }
                    digits
                };
                let (l, r) = (take_number(&mut left), take_number(&mut right));
                let (l, r) = (l.trim_start_matches('0'), r.trim_start_matches('0'));
                let ordering = l.len().cmp(&r.len()).then_with(|| l.cmp(r));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

/// Order pane summaries by marker symbol, then assay type display order
pub fn sort_image_meta(meta: &mut [ImageMeta]) {
    meta.sort_by(|a, b| {
        smart_alpha_cmp(&a.marker_symbol, &b.marker_symbol).then(a.assay_type_seq.cmp(&b.assay_type_seq))
    });
}

/// Window caches of the image pane strategy
#[derive(Debug, Default)]
pub struct PaneCaches {
    pub results: MultiLookup<ImagePaneKey, ResultKey>,
    pub assay_ids: Lookup<ImagePaneKey, Arc<str>>,
    pub meta: FxHashMap<ImagePaneKey, Vec<ImageMeta>>,
}

struct AssayInfo {
    id: Arc<str>,
    type_seq: i64,
}

pub struct ImagePaneStrategy {
    chunk: i64,
    pending: Option<(KeyWindow, Vec<ImagePaneRow>)>,
}

impl ImagePaneStrategy {
    #[must_use]
    pub const fn new(chunk: i64) -> Self {
        Self {
            chunk,
            pending: None,
        }
    }
}

fn read_panes(source: &dyn FactSource, window: KeyWindow) -> Result<Vec<ImagePaneRow>> {
    let mut panes: Vec<ImagePaneRow> = source.range_rows(Table::ImagePane, "imagepane_key", window)?;
    panes.retain(|pane| pane.pixeldb_id.is_some());
    Ok(panes)
}

impl ChunkStrategy for ImagePaneStrategy {
    type Row = ImagePaneRow;
    type Caches = PaneCaches;

    fn name(&self) -> &str {
        "image panes"
    }

    fn window_bounds(&mut self, source: &dyn FactSource) -> Result<WindowBounds> {
        Ok(WindowBounds::from_zero(
            source.max_key(Table::ImagePane, "imagepane_key")?,
            self.chunk,
        ))
    }

    fn refresh_caches(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<PaneCaches> {
        let panes = read_panes(source, window)?;

        let mut links: Vec<ResultImagePaneRow> = source.key_rows(
            Table::ResultImagePane,
            "imagepane_key",
            panes.iter().map(|p| p.imagepane_key.get()),
        )?;
        links.sort_by_key(|link| (link.imagepane_key, link.result_key));
        let results: Vec<ClassicalResultRow> = source.key_rows(
            Table::ExpressionResult,
            "result_key",
            links.iter().map(|l| l.result_key.get()),
        )?;
        let marker_keys: FxHashSet<MarkerKey> = results.iter().map(|r| r.marker_key).collect();
        let markers = load_markers(source, marker_keys)?;
        let assay_keys: FxHashSet<i64> = results.iter().map(|r| r.assay_key.get()).collect();
        let results: Lookup<ResultKey, ClassicalResultRow> =
            results.into_iter().map(|r| (r.result_key, r)).collect();
        let assay_rows: Vec<AssayRow> = source.key_rows(Table::Assay, "assay_key", assay_keys)?;
        let assays: Lookup<AssayKey, AssayInfo> = assay_rows
            .into_iter()
            .map(|row| {
                let info = AssayInfo {
                    id: Arc::from(row.assay_id),
                    type_seq: row.assay_type_seq.unwrap_or(UNKNOWN_ASSAY_TYPE_SEQ),
                };
                (row.assay_key, info)
            })
            .collect();

        let mut caches = PaneCaches::default();
        for link in links {
            let Some(result) = results.get(&link.result_key) else {
                log::warn!(
                    "Image pane {} shows unknown result {}",
                    link.imagepane_key,
                    link.result_key
                );
                continue;
            };
            let (Some(marker), Some(assay)) = (markers.get(&result.marker_key), assays.get(&result.assay_key))
            else {
                log::warn!(
                    "Result {} in image pane {} has no marker or assay",
                    result.result_key,
                    link.imagepane_key
                );
                continue;
            };
            caches.results.push_unique(link.imagepane_key, link.result_key);
            if caches.assay_ids.get(&link.imagepane_key).is_none() {
                caches.assay_ids.insert(link.imagepane_key, Arc::clone(&assay.id));
            }

            let meta = caches.meta.entry(link.imagepane_key).or_default();
            let hybridization = link.hybridization.as_deref();
            let position = meta
                .iter()
                .position(|m| m.matches(&marker.symbol, &result.assay_type, hybridization));
            let entry = match position {
                Some(position) => &mut meta[position],
                None => {
                    meta.push(ImageMeta {
                        marker_symbol: Arc::clone(&marker.symbol),
                        assay_type: result.assay_type.clone(),
                        hybridization: link.hybridization.clone(),
                        specimen_labels: Vec::new(),
                        assay_type_seq: assay.type_seq,
                    });
                    let last = meta.len() - 1;
                    &mut meta[last]
                }
            };
            if let Some(label) = link.specimen_label {
                entry.specimen_labels.push(SpecimenLabel {
                    label,
                    assay_id: Arc::clone(&assay.id),
                });
            }
        }
        for meta in caches.meta.values_mut() {
            sort_image_meta(meta);
        }

        log::debug!(
            "Window {window}: {} panes, {} with results",
            panes.len(),
            caches.results.len()
        );
        self.pending = Some((window, panes));
        Ok(caches)
    }

    fn stream_rows(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Vec<ImagePaneRow>> {
        match self.pending.take() {
            Some((pending, rows)) if pending == window => Ok(rows),
            _ => read_panes(source, window),
        }
    }

    fn assemble(
        &mut self,
        pane: &ImagePaneRow,
        caches: &PaneCaches,
    ) -> std::result::Result<Document, SkipRow> {
        let label = format!("image pane {}", pane.imagepane_key);
        let results = caches.results.get(&pane.imagepane_key);
        if results.is_empty() {
            return Err(SkipRow::new(&label, "no results shown"));
        }

        let mut document = Document::new(pane.imagepane_key.to_string());
        document.set(fields::IMAGE_PANE_KEY, pane.imagepane_key.get());
        document.set(fields::IMAGE_ID, pane.image_id.as_str());
        document.set_opt(fields::ASSAY_ID, caches.assay_ids.get(&pane.imagepane_key).cloned());
        document.set_opt(fields::PIXELDB_ID, pane.pixeldb_id.as_deref());
        document.set(
            fields::IMAGE_LABEL,
            format!("{}{}", pane.figure_label, pane.pane_label.as_deref().unwrap_or_default()),
        );
        document.set(fields::IMAGE_WIDTH, pane.image_width);
        document.set(fields::IMAGE_HEIGHT, pane.image_height);
        document.set(fields::PANE_WIDTH, pane.width);
        document.set(fields::PANE_HEIGHT, pane.height);
        document.set(fields::PANE_X, pane.x);
        document.set(fields::PANE_Y, pane.y);
        document.set(fields::BY_ASSAY_TYPE, pane.by_assay_type);
        document.set(fields::BY_MARKER, pane.by_marker);
        document.set(fields::BY_HYBRIDIZATION_ASC, pane.by_hybridization_asc);
        document.set(fields::BY_HYBRIDIZATION_DESC, pane.by_hybridization_desc);
        document.set(fields::RESULT_KEY, results.iter().map(|r| r.get()).collect::<Vec<i64>>());

        let meta = caches
            .meta
            .get(&pane.imagepane_key)
            .map(|meta| {
                meta.iter()
                    .map(|m| serde_json::to_string(m).map(Arc::from))
                    .collect::<serde_json::Result<Vec<Arc<str>>>>()
            })
            .transpose()
            .map_err(|e| SkipRow::new(&label, format!("image metadata not serializable: {e}")))?;
        document.set_list(fields::IMAGE_META, meta.unwrap_or_default());
        Ok(document)
    }
}
