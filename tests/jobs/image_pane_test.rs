use gxd_indexer::jobs::image_pane;
use gxd_indexer::model::{FieldValue, fields};
use gxd_indexer::{MemorySinkFactory, job_by_name};

use crate::utils::{expression_source, find, ids, list, memory_context, test_config};

fn run() -> (gxd_indexer::JobReport, Vec<gxd_indexer::Document>) {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(expression_source(), &sinks, test_config(2));
    let report = job_by_name(image_pane::NAME).unwrap().run(&ctx).unwrap();
    (report, sinks.collection(image_pane::NAME))
}

fn meta(document: &gxd_indexer::Document) -> Vec<serde_json::Value> {
    list(document, fields::IMAGE_META)
        .iter()
        .map(|json| serde_json::from_str(json).unwrap())
        .collect()
}

#[test]
fn test_panes_need_an_image_and_results() {
    let (report, documents) = run();
    // pane 2 has no pixel store image, pane 3 shows no results
    assert_eq!(ids(&documents), vec!["1", "4"]);
    assert_eq!(report.stats.skipped, 1);
}

#[test]
fn test_pane_fields() {
    let (_, documents) = run();
    let pane = find(&documents, "1");
    assert_eq!(pane.get(fields::IMAGE_PANE_KEY), Some(&FieldValue::Int(1)));
    assert_eq!(pane.text(fields::IMAGE_ID), Some("MGI:I1"));
    assert_eq!(pane.text(fields::PIXELDB_ID), Some("5001"));
    assert_eq!(pane.text(fields::IMAGE_LABEL), Some("Fig 1A"));
    assert_eq!(pane.text(fields::ASSAY_ID), Some("MGI:A1000"));
    assert_eq!(pane.get(fields::PANE_WIDTH), Some(&FieldValue::Int(100)));
    assert_eq!(pane.get(fields::IMAGE_HEIGHT), Some(&FieldValue::Int(300)));
    assert_eq!(pane.get(fields::BY_MARKER), Some(&FieldValue::Int(11)));
    assert_eq!(pane.get(fields::RESULT_KEY), Some(&FieldValue::IntList(vec![1, 2, 3])));

    let unlabelled = find(&documents, "4");
    assert_eq!(unlabelled.text(fields::IMAGE_LABEL), Some("Fig 2"));
    assert_eq!(unlabelled.text(fields::ASSAY_ID), Some("MGI:A1001"));
}

#[test]
fn test_results_grouped_into_image_meta() {
    let (_, documents) = run();
    let grouped = meta(find(&documents, "1"));
    assert_eq!(grouped.len(), 2);

    assert_eq!(grouped[0]["markerSymbol"], "Pax6");
    assert_eq!(grouped[0]["assayType"], "RNA in situ");
    assert_eq!(grouped[0]["hybridization"], "section");
    let labels: Vec<&str> = grouped[0]["specimenLabels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["1a", "2a"]);
    assert_eq!(grouped[0]["specimenLabels"][0]["assayId"], "MGI:A1000");

    assert_eq!(grouped[1]["markerSymbol"], "Shh");
    assert!(grouped[1]["hybridization"].is_null());

    let unlabelled = meta(find(&documents, "4"));
    assert!(unlabelled[0]["specimenLabels"].as_array().unwrap().is_empty());
}
