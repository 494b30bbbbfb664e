use gxd_indexer::jobs::marker_summary;
use gxd_indexer::model::{FieldValue, fields};
use gxd_indexer::{MemorySinkFactory, job_by_name};

use crate::utils::{expression_source, find, ids, list, memory_context, test_config};

fn run(chunk: i64) -> (gxd_indexer::JobReport, Vec<gxd_indexer::Document>) {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(expression_source(), &sinks, test_config(chunk));
    let report = job_by_name(marker_summary::NAME).unwrap().run(&ctx).unwrap();
    (report, sinks.collection(marker_summary::NAME))
}

#[test]
fn test_one_document_per_marker_with_data() {
    let (report, documents) = run(1);
    assert_eq!(ids(&documents), vec!["10", "11"]);
    // the marker with unparseable coordinates
    assert_eq!(report.stats.skipped, 1);
}

#[test]
fn test_filters_merge_classical_and_rnaseq() {
    let (_, documents) = run(2);
    let pax6 = find(&documents, "10");
    assert_eq!(pax6.text(fields::MARKER_SYMBOL), Some("Pax6"));
    assert_eq!(pax6.text(fields::MARKER_TYPE), Some("Gene"));
    assert_eq!(list(pax6, "mp_header"), vec!["vision/eye"]);
    assert_eq!(list(pax6, fields::ASSAY_TYPE), vec!["RNA in situ", "RNA-Seq"]);
    assert_eq!(
        list(pax6, fields::STRUCTURE_EXACT),
        vec!["EMAPS:102", "EMAPS:103", "EMAPS:104", "EMAPS:106"]
    );
    assert_eq!(pax6.get(fields::THEILER_STAGE), Some(&FieldValue::IntList(vec![12, 20])));
    assert_eq!(list(pax6, fields::IS_EXPRESSED), vec!["No", "Yes"]);
    assert_eq!(list(pax6, fields::AGE_BINS), vec!["10.5", "12", "Embryonic"]);
    assert_eq!(list(pax6, fields::IS_WILD_TYPE), vec!["mutant", "wild type"]);
    assert_eq!(list(pax6, fields::JNUM_ID), vec!["J:900"]);
}

#[test]
fn test_uncertain_calls_and_mutants_are_kept() {
    let (_, documents) = run(2);
    let shh = find(&documents, "11");
    assert_eq!(list(shh, fields::ASSAY_TYPE), vec!["Immunohistochemistry", "RNA-Seq"]);
    assert_eq!(list(shh, fields::IS_EXPRESSED), vec!["Ambiguous", "No", "Yes"]);
    assert_eq!(
        list(shh, fields::STRUCTURE_EXACT),
        vec!["EMAPS:102", "EMAPS:104", "EMAPS:107"]
    );
    assert_eq!(list(shh, fields::IS_WILD_TYPE), vec!["mutant", "wild type"]);
}
