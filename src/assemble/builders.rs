//! Field groups shared by several document kinds.

use std::sync::Arc;

use super::{StructureFields, WildTypePolicy, format_cm_offset, genomic_location, group_key, round_age};
use crate::cache::{GenotypeAlleles, GenotypeInfo, MarkerInfo, ReferenceInfo};
use crate::model::{Document, GenotypeKey, MarkerKey, fields};

/// Marker nomenclature, location and sort order
///
/// Fails with the reason when the marker's coordinates cannot be parsed.
pub fn apply_marker(
    document: &mut Document,
    key: MarkerKey,
    marker: &MarkerInfo,
    synonyms: &[Arc<str>],
) -> Result<(), String> {
    let location = genomic_location(
        marker.chromosome.as_deref(),
        marker.start_coordinate.as_deref(),
        marker.end_coordinate.as_deref(),
    )?;

    document.set(fields::MARKER_KEY, key.get());
    document.set(fields::MARKER_ID, Arc::clone(&marker.id));
    document.set(fields::MARKER_SYMBOL, Arc::clone(&marker.symbol));
    document.set(fields::MARKER_NAME, Arc::clone(&marker.name));
    document.set(fields::MARKER_TYPE, Arc::clone(&marker.marker_type));
    document.set_list(fields::MARKER_SYNONYMS, synonyms.to_vec());
    document.set_opt(fields::CHROMOSOME, marker.chromosome.clone());
    document.set_opt(fields::STRAND, marker.strand.clone());

    let cm_offset = format_cm_offset(marker.cm_offset);
    if !cm_offset.is_empty() {
        document.set(fields::CM_OFFSET, cm_offset);
    }
    if let Some((location, start, end)) = location {
        document.set(fields::GENOMIC_LOCATION, location);
        document.set(fields::START_COORDINATE, start);
        document.set(fields::END_COORDINATE, end);
    }
    document.set(fields::BY_SYMBOL, marker.by_symbol);
    Ok(())
}

/// Age label and rounded bounds
pub fn apply_age(document: &mut Document, label: Option<&str>, min: Option<f64>, max: Option<f64>) {
    document.set_opt(fields::AGE, label);
    document.set(fields::AGE_MIN, round_age(min));
    document.set(fields::AGE_MAX, round_age(max));
}

/// Expression call and the two matrix grouping keys
pub fn apply_call(
    document: &mut Document,
    structure: &StructureFields,
    marker: MarkerKey,
    expressed: &str,
) {
    let stage = structure.stage.to_string();
    document.set(fields::IS_EXPRESSED, expressed);
    document.set(
        fields::STAGE_MATRIX_GROUP,
        group_key(&structure.emapa_id, expressed, &stage, None),
    );
    document.set(
        fields::GENE_MATRIX_GROUP,
        group_key(&structure.emapa_id, expressed, &marker.to_string(), Some(&stage)),
    );
}

/// Genotype, strain and wild-type label under the given policy
pub fn apply_genotype(
    document: &mut Document,
    key: GenotypeKey,
    policy: WildTypePolicy,
    genotype: Option<&GenotypeInfo>,
    alleles: Option<&GenotypeAlleles>,
) {
    let combination = genotype.and_then(|g| g.allele_combination.clone());
    let label = policy.label(key, genotype.map(|g| g.is_wild_type), combination.as_deref());

    document.set(fields::GENOTYPE_KEY, key.get());
    document.set(fields::IS_WILD_TYPE, label);
    document.set_opt(fields::ALLELE_PAIRS, combination);
    document.set_opt(fields::STRAIN, genotype.and_then(|g| g.background.clone()));
    if let Some(alleles) = alleles {
        document.set_list(fields::ALLELE_IDS, alleles.allele_ids.clone());
        document.set_list(fields::MUTATED_IN, alleles.mutated_in.clone());
    }
}

pub fn apply_reference(document: &mut Document, reference: &ReferenceInfo) {
    document.set(fields::JNUM_ID, Arc::clone(&reference.jnum_id));
    document.set(fields::SHORT_CITATION, Arc::clone(&reference.short_citation));
    document.set(fields::BY_REFERENCE, reference.by_reference);
}
