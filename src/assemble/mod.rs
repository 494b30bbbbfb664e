//! Document assembly.
//!
//! The functions in this module are the field derivation rules shared by
//! every document type. Per-collection builders live with their jobs and call
//! into these rules and into [`structure::StructureExpander`].

pub mod builders;
pub mod structure;

use std::fmt;

use crate::model::GenotypeKey;

pub use builders::{apply_age, apply_call, apply_genotype, apply_marker, apply_reference};
pub use structure::{StructureExpander, StructureFields};

/// Value emitted for an age that was not recorded
pub const MISSING_AGE: f64 = -1.0;

/// Separator used by matrix grouping keys
pub const GROUP_SEPARATOR: &str = "_";

/// Field value for wild-type genotypes
pub const WILD_TYPE: &str = "wild type";

/// Field value for mutant genotypes
pub const MUTANT: &str = "mutant";

/// Last embryonic age, in days post coitum
pub const LAST_EMBRYONIC_DPC: f64 = 20.5;

/// Reason a single row produced no document
///
/// Skipped rows are logged and counted; they never fail a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRow {
    pub row: String,
    pub reason: String,
}

impl SkipRow {
    pub fn new(row: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self {
            row: row.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SkipRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped {}: {}", self.row, self.reason)
    }
}

/// Round an age in days post coitum to the nearest half day
///
/// The fractional part becomes .0 below 0.25, .5 below 0.75 and otherwise
/// carries into the next whole day. A missing age maps to [`MISSING_AGE`].
#[must_use]
pub fn round_age(age: Option<f64>) -> f64 {
    let Some(age) = age.filter(|a| a.is_finite()) else {
        return MISSING_AGE;
    };
    let whole = age.floor();
    let fraction = age - whole;
    let rounded = if fraction < 0.25 {
        0.0
    } else if fraction < 0.75 {
        0.5
    } else {
        1.0
    };
    whole + rounded
}

/// Collapse a classical detection level to Yes / No
///
/// Levels that are neither positive nor `Absent` pass through unchanged.
#[must_use]
pub fn map_detection_level(level: &str) -> &str {
    match level {
        "Present" | "Trace" | "Weak" | "Moderate" | "Strong" | "Very strong" => "Yes",
        "Absent" => "No",
        other => other,
    }
}

/// Collapse an RNA-seq TPM level to Yes / No
#[must_use]
pub fn map_tpm_level(level: &str) -> &'static str {
    if level == "Below Cutoff" { "No" } else { "Yes" }
}

/// Join matrix grouping components with [`GROUP_SEPARATOR`]
///
/// The first three components are always present; the fourth is appended
/// only when given.
#[must_use]
pub fn group_key(first: &str, second: &str, third: &str, fourth: Option<&str>) -> String {
    let mut key = String::with_capacity(
        first.len() + second.len() + third.len() + fourth.map_or(0, str::len) + 3,
    );
    key.push_str(first);
    key.push_str(GROUP_SEPARATOR);
    key.push_str(second);
    key.push_str(GROUP_SEPARATOR);
    key.push_str(third);
    if let Some(fourth) = fourth {
        key.push_str(GROUP_SEPARATOR);
        key.push_str(fourth);
    }
    key
}

/// The three distinct ways a genotype is judged wild type
///
/// Each document type uses exactly one of these; they are not
/// interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildTypePolicy {
    /// Classical results: explicit flag, or no genotype applies
    FlagOrNoGenotype,
    /// RNA-seq results: no genotype applies, or no allele combination
    NoGenotypeOrNoAlleles,
    /// Marker aggregates: no allele combination
    NoAlleles,
}

impl WildTypePolicy {
    /// Whether a genotype counts as wild type
    ///
    /// `flag` is the explicit wild-type flag and `allele_combination` the
    /// genotype's allele pairs; both are `None` when no genotype row is known.
    #[must_use]
    pub fn is_wild_type(
        self,
        genotype: GenotypeKey,
        flag: Option<bool>,
        allele_combination: Option<&str>,
    ) -> bool {
        let no_alleles = allele_combination.is_none_or(|c| c.trim().is_empty());
        match self {
            Self::FlagOrNoGenotype => flag == Some(true) || genotype.is_none(),
            Self::NoGenotypeOrNoAlleles => genotype.is_none() || no_alleles,
            Self::NoAlleles => no_alleles,
        }
    }

    /// Field value for the wild-type classification
    #[must_use]
    pub fn label(
        self,
        genotype: GenotypeKey,
        flag: Option<bool>,
        allele_combination: Option<&str>,
    ) -> &'static str {
        if self.is_wild_type(genotype, flag, allele_combination) {
            WILD_TYPE
        } else {
            MUTANT
        }
    }
}

/// Centimorgan position as indexed; unknown positions (-1) become empty
#[must_use]
pub fn format_cm_offset(cm_offset: Option<f64>) -> String {
    match cm_offset {
        Some(cm) if (cm + 1.0).abs() > f64::EPSILON => format!("{cm:.2}"),
        _ => String::new(),
    }
}

/// Genome coordinate range `chr:start-end`
///
/// Returns `Ok(None)` when the marker has no coordinates and an error
/// message when a coordinate does not parse.
pub fn genomic_location(
    chromosome: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<(String, i64, i64)>, String> {
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(None);
    };
    let parse = |value: &str| {
        let trimmed = value.trim();
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as i64)
            .ok_or_else(|| format!("unparseable coordinate {value:?}"))
    };
    let (start, end) = (parse(start)?, parse(end)?);
    if end < start {
        return Err(format!("coordinate range {start}-{end} is reversed"));
    }
    let chromosome = chromosome.unwrap_or("UN");
    Ok(Some((format!("{chromosome}:{start}-{end}"), start, end)))
}

/// Age filter a result can be found under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBin {
    /// One selectable embryonic age, in half days post coitum
    Dpc(u8),
    Embryonic,
    Postnatal,
}

impl AgeBin {
    /// Field value of the bin; whole days drop the fraction
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Dpc(half_days) if half_days % 2 == 0 => (half_days / 2).to_string(),
            Self::Dpc(half_days) => format!("{}.5", half_days / 2),
            Self::Embryonic => "Embryonic".to_string(),
            Self::Postnatal => "Postnatal".to_string(),
        }
    }
}

/// Age filters overlapping the range `min..=max`
///
/// A range starting after [`LAST_EMBRYONIC_DPC`] is only postnatal. Ranges
/// with a missing bound fall under no filter.
#[must_use]
pub fn age_bins(min: Option<f64>, max: Option<f64>) -> Vec<AgeBin> {
    let (Some(min), Some(max)) = (min, max) else {
        return Vec::new();
    };
    if min > LAST_EMBRYONIC_DPC {
        return vec![AgeBin::Postnatal];
    }
    let last_half_day = (LAST_EMBRYONIC_DPC * 2.0) as u8;
    let mut bins: Vec<AgeBin> = (1..=last_half_day)
        .filter(|half_days| (min..=max).contains(&(f64::from(*half_days) / 2.0)))
        .map(AgeBin::Dpc)
        .collect();
    bins.push(AgeBin::Embryonic);
    if max > LAST_EMBRYONIC_DPC {
        bins.push(AgeBin::Postnatal);
    }
    bins
}

/// Prefix a note with the conditional-mutant marker when applicable
#[must_use]
pub fn conditional_note(is_conditional: bool, note: Option<&str>) -> Option<String> {
    match (is_conditional, note) {
        (true, Some(note)) => Some(format!("Conditional mutant. {note}")),
        (true, None) => Some("Conditional mutant.".to_string()),
        (false, note) => note.map(str::to_string),
    }
}
