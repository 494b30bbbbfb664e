use gxd_indexer::jobs::{has_image, result};
use gxd_indexer::model::{FieldValue, fields};
use gxd_indexer::{MemorySinkFactory, job_by_name};

use gxd_indexer::MemoryFactSource;

use crate::utils::{expression_source, find, ids, list, memory_context, test_config, unpublished_marker_source};

fn run(job: &str) -> (gxd_indexer::JobReport, Vec<gxd_indexer::Document>) {
    run_on(expression_source(), job)
}

fn run_on(source: MemoryFactSource, job: &str) -> (gxd_indexer::JobReport, Vec<gxd_indexer::Document>) {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(source, &sinks, test_config(2));
    let report = job_by_name(job).unwrap().run(&ctx).unwrap();
    (report, sinks.collection(job))
}

#[test]
fn test_result_documents() {
    let (report, documents) = run(result::NAME);
    assert_eq!(
        ids(&documents),
        vec![
            "Immunohistochemistry-3",
            "Immunohistochemistry-6",
            "RNA in situ-1",
            "RNA in situ-2",
            "RNA-Seq-rnaseq1",
            "RNA-Seq-rnaseq2",
            "RNA-Seq-rnaseq3",
        ]
    );
    assert_eq!(report.stats.documents, 7);
    // result 4 has unparseable marker coordinates
    assert_eq!(report.stats.skipped, 1);
}

#[test]
fn test_classical_fields() {
    let (_, documents) = run(result::NAME);
    let doc = find(&documents, "RNA in situ-1");
    assert_eq!(doc.text(fields::MARKER_SYMBOL), Some("Pax6"));
    assert_eq!(doc.text(fields::GENOMIC_LOCATION), Some("2:105000-105692"));
    assert_eq!(list(doc, fields::MARKER_SYNONYMS), vec!["Dey"]);
    assert_eq!(doc.get(fields::A_BY_SYMBOL), Some(&FieldValue::Int(2)));
    assert_eq!(doc.text(fields::ASSAY_ID), Some("MGI:A1000"));
    assert_eq!(doc.text(fields::STRUCTURE_EXACT), Some("EMAPS:103"));
    assert_eq!(doc.text(fields::EMAPA_ID), Some("EMAPA:4"));
    assert_eq!(doc.get(fields::THEILER_STAGE), Some(&FieldValue::Int(12)));
    assert_eq!(list(doc, fields::STRUCTURE_ANCESTORS), vec!["EMAPA:1", "EMAPA:2"]);
    assert_eq!(list(doc, fields::FIGURE_LABELS), vec!["Fig 1"]);
    assert_eq!(doc.text(fields::IS_EXPRESSED), Some("Yes"));
    assert_eq!(doc.text(fields::DETECTION_LEVEL), Some("Present"));
    assert_eq!(doc.text(fields::IS_WILD_TYPE), Some(gxd_indexer::assemble::WILD_TYPE));
    assert_eq!(doc.text(fields::JNUM_ID), Some("J:900"));
    assert_eq!(list(doc, fields::ANNOTATION_IDS), vec!["GO:2", "GO:1"]);
    assert_eq!(list(doc, "mp_header"), vec!["vision/eye"]);
    assert_eq!(list(doc, fields::CELL_TYPE), vec!["pyramidal neuron"]);
    // cell type IDs and headers only go into the image collection
    assert!(doc.get(fields::CELL_TYPE_ID).is_none());
    assert!(doc.get(fields::CELL_TYPE_HEADER).is_none());
}

#[test]
fn test_markers_without_expression_literature() {
    let (report, documents) = run_on(unpublished_marker_source(), result::NAME);
    // classical Pax6 results are dropped, its RNA-seq measurements are not
    assert_eq!(
        ids(&documents),
        vec![
            "Immunohistochemistry-3",
            "Immunohistochemistry-6",
            "RNA-Seq-rnaseq1",
            "RNA-Seq-rnaseq2",
            "RNA-Seq-rnaseq3",
        ]
    );
    assert_eq!(report.stats.skipped, 1);

    let (_, imaged) = run_on(unpublished_marker_source(), has_image::NAME);
    assert_eq!(ids(&imaged), vec!["Immunohistochemistry-3"]);
}

#[test]
fn test_mutant_and_missing_genotype() {
    let (_, documents) = run(result::NAME);
    let mutant = find(&documents, "Immunohistochemistry-3");
    assert_eq!(mutant.text(fields::IS_WILD_TYPE), Some(gxd_indexer::assemble::MUTANT));
    assert_eq!(mutant.text(fields::IS_EXPRESSED), Some("No"));
    assert_eq!(mutant.text(fields::ALLELE_PAIRS), Some("Shh<tm1>/Shh<+>"));
    assert_eq!(list(mutant, fields::MUTATED_IN), vec!["Shh"]);
    assert_eq!(mutant.text(fields::RESULT_NOTE), Some("Conditional mutant."));

    let no_genotype = find(&documents, "Immunohistochemistry-6");
    assert_eq!(no_genotype.text(fields::IS_WILD_TYPE), Some(gxd_indexer::assemble::WILD_TYPE));
    assert_eq!(no_genotype.text(fields::IS_EXPRESSED), Some("Ambiguous"));
    assert!(no_genotype.get(fields::GENOMIC_LOCATION).is_none());
}

#[test]
fn test_rnaseq_fields() {
    let (_, documents) = run(result::NAME);
    let doc = find(&documents, "RNA-Seq-rnaseq1");
    assert_eq!(doc.text(fields::ASSAY_TYPE), Some("RNA-Seq"));
    assert_eq!(doc.text(fields::MARKER_SYMBOL), Some("Shh"));
    assert_eq!(doc.text(fields::AVG_QN_TPM), Some("12.35"));
    assert_eq!(doc.text(fields::TPM_LEVEL), Some("High"));
    assert_eq!(doc.text(fields::IS_EXPRESSED), Some("Yes"));
    assert_eq!(doc.text(fields::EXPERIMENT_ID), Some("E-MTAB-700"));
    assert_eq!(doc.get(fields::REPLICATE_COUNT), Some(&FieldValue::Int(3)));
    // sorts after every classical marker: max by_symbol plus the reference order
    assert_eq!(doc.get(fields::A_BY_SYMBOL), Some(&FieldValue::Int(3 + 5)));

    let below = find(&documents, "RNA-Seq-rnaseq2");
    assert_eq!(below.text(fields::IS_EXPRESSED), Some("No"));
    assert_eq!(below.text(fields::IS_WILD_TYPE), Some(gxd_indexer::assemble::MUTANT));
    assert_eq!(below.text(fields::RESULT_NOTE), Some("Conditional mutant. treated"));
}

#[test]
fn test_has_image_documents() {
    let (report, documents) = run(has_image::NAME);
    assert_eq!(ids(&documents), vec!["Immunohistochemistry-3", "RNA in situ-1"]);
    assert_eq!(report.stats.skipped, 0);

    let imaged = find(&documents, "RNA in situ-1");
    assert_eq!(list(imaged, fields::CELL_TYPE_ID), vec!["CL:1"]);
    assert_eq!(list(imaged, fields::CELL_TYPE_HEADER), vec!["neuron"]);
    assert_eq!(list(imaged, fields::CELL_TYPE), vec!["pyramidal neuron"]);
    assert_eq!(imaged.text(fields::BY_MUTANT_ALLELES), Some(""));

    let mutant = find(&documents, "Immunohistochemistry-3");
    assert_eq!(mutant.text(fields::BY_MUTANT_ALLELES), Some("Shh<tm1>/Shh<+>"));
    assert_eq!(list(mutant, fields::FIGURE_LABELS), vec!["Fig 2A"]);
}
