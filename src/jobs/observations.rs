//! Marker-level expression observations.
//!
//! The marker jobs aggregate every usable result of a marker: classical
//! results from non-reporter assays and, for the profile job, RNA-seq
//! measurements, restricted to wild-type specimens. Classical specimens are
//! wild type when flagged so or when no genotype applies; RNA-seq samples
//! when their genotype carries no allele combination. Calls that are neither
//! positive nor negative are dropped.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use super::result::{MarkerCaches, is_excluded_assay_type};
use crate::assemble::{WildTypePolicy, map_detection_level, map_tpm_level};
use crate::cache::{GenotypeInfo, Lookup, load_genotypes};
use crate::error::Result;
use crate::model::rows::{ClassicalResultRow, ConsolidatedSampleRow, RnaSeqMeasurementRow};
use crate::model::{GenotypeKey, MarkerKey, TermKey};
use crate::scan::{KeyWindow, WindowBounds};
use crate::source::{FactSource, FactSourceExt, Table};

/// Kind of result an observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultSource {
    Classical,
    RnaSeq,
}

/// One wild-type result of a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub source: ResultSource,
    pub emaps: TermKey,
    pub expressed: bool,
}

/// Every observation of one marker, classical before RNA-seq
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerObservations {
    pub marker: MarkerKey,
    pub observations: Vec<Observation>,
}

impl MarkerObservations {
    /// Positive observations of one kind
    pub fn positive(&self, source: ResultSource) -> impl Iterator<Item = &Observation> {
        self.observations
            .iter()
            .filter(move |o| o.expressed && o.source == source)
    }
}

/// Result kinds a marker job aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationScope {
    /// Classical results only
    Classical,
    /// Classical results and RNA-seq measurements
    ClassicalAndRnaSeq,
}

impl ObservationScope {
    const fn includes_rna_seq(self) -> bool {
        matches!(self, Self::ClassicalAndRnaSeq)
    }
}

/// Positive or negative reading of a mapped call, `None` for anything else
#[must_use]
pub fn call_polarity(mapped: &str) -> Option<bool> {
    match mapped {
        "Yes" => Some(true),
        "No" => Some(false),
        _ => None,
    }
}

fn is_wild_type(
    policy: WildTypePolicy,
    genotypes: &Lookup<GenotypeKey, GenotypeInfo>,
    key: GenotypeKey,
) -> bool {
    let genotype = genotypes.get(&key);
    policy.is_wild_type(
        key,
        genotype.map(|g| g.is_wild_type),
        genotype.and_then(|g| g.allele_combination.as_deref()),
    )
}

/// Observations of every marker whose key lies in `window`, in key order
pub fn load_observations(
    source: &dyn FactSource,
    window: KeyWindow,
    scope: ObservationScope,
) -> Result<Vec<MarkerObservations>> {
    let mut grouped: BTreeMap<MarkerKey, Vec<Observation>> = BTreeMap::new();

    let classical: Vec<ClassicalResultRow> =
        source.range_rows(Table::ExpressionResult, "marker_key", window)?;
    let genotype_keys: FxHashSet<GenotypeKey> = classical.iter().map(|r| r.genotype_key).collect();
    let genotypes = load_genotypes(source, genotype_keys)?;
    for row in classical {
        if is_excluded_assay_type(&row.assay_type)
            || !is_wild_type(WildTypePolicy::FlagOrNoGenotype, &genotypes, row.genotype_key)
        {
            continue;
        }
        if let Some(expressed) = call_polarity(map_detection_level(&row.detection_level)) {
            grouped.entry(row.marker_key).or_default().push(Observation {
                source: ResultSource::Classical,
                emaps: row.emaps_key,
                expressed,
            });
        }
    }

    if scope.includes_rna_seq() {
        load_rna_seq(source, window, &mut grouped)?;
    }

    Ok(grouped
        .into_iter()
        .map(|(marker, observations)| MarkerObservations {
            marker,
            observations,
        })
        .collect())
}

fn load_rna_seq(
    source: &dyn FactSource,
    window: KeyWindow,
    grouped: &mut BTreeMap<MarkerKey, Vec<Observation>>,
) -> Result<()> {
    let measurements: Vec<RnaSeqMeasurementRow> =
        source.range_rows(Table::RnaSeqMeasurement, "marker_key", window)?;
    let sample_keys: FxHashSet<i64> = measurements.iter().map(|m| m.sample_key.get()).collect();
    let samples: Vec<ConsolidatedSampleRow> =
        source.key_rows(Table::ConsolidatedSample, "sample_key", sample_keys)?;
    let genotypes = load_genotypes(source, samples.iter().map(|s| s.genotype_key))?;
    let samples: Lookup<_, _> = samples.into_iter().map(|s| (s.sample_key, s)).collect();
    for row in measurements {
        let Some(sample) = samples.get(&row.sample_key) else {
            log::debug!("Measurement {} refers to unknown sample {}", row.measurement_key, row.sample_key);
            continue;
        };
        if !is_wild_type(WildTypePolicy::NoAlleles, &genotypes, sample.genotype_key) {
            continue;
        }
        if let Some(expressed) = call_polarity(map_tpm_level(&row.level)) {
            grouped.entry(row.marker_key).or_default().push(Observation {
                source: ResultSource::RnaSeq,
                emaps: sample.emaps_key,
                expressed,
            });
        }
    }
    Ok(())
}

/// Window state shared by the marker strategies
#[derive(Debug)]
pub struct MarkerWindows {
    chunk: i64,
    scope: ObservationScope,
    pending: Option<(KeyWindow, Vec<MarkerObservations>)>,
}

impl MarkerWindows {
    #[must_use]
    pub const fn new(chunk: i64, scope: ObservationScope) -> Self {
        Self {
            chunk,
            scope,
            pending: None,
        }
    }

    pub fn bounds(&self, source: &dyn FactSource) -> Result<WindowBounds> {
        Ok(WindowBounds::from_zero(
            source.max_key(Table::Marker, "marker_key")?,
            self.chunk,
        ))
    }

    /// Read the window's observations and cache the markers they refer to
    pub fn refresh(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<MarkerCaches> {
        let rows = load_observations(source, window, self.scope)?;
        let keys: FxHashSet<MarkerKey> = rows.iter().map(|r| r.marker).collect();
        let caches = MarkerCaches::load(source, &keys)?;
        self.pending = Some((window, rows));
        Ok(caches)
    }

    pub fn rows(&mut self, source: &dyn FactSource, window: KeyWindow) -> Result<Vec<MarkerObservations>> {
        match self.pending.take() {
            Some((pending, rows)) if pending == window => Ok(rows),
            _ => load_observations(source, window, self.scope),
        }
    }
}
