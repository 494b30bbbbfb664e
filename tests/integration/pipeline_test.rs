use std::sync::Arc;

use gxd_indexer::jobs::{dag_edge, result};
use gxd_indexer::model::fields;
use gxd_indexer::model::rows::{MarkerSynonymRow, RnaSeqMeasurementRow};
use gxd_indexer::scan::{MemoryProbe, ScriptedMemoryProbe};
use gxd_indexer::{MemorySinkFactory, Table, job_by_name, job_names, resolve_jobs, run_jobs};

use crate::utils::{expression_source, find, ids, list, memory_context, test_config};

fn run_all(chunk: i64) -> MemorySinkFactory {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(expression_source(), &sinks, test_config(chunk));
    let report = run_jobs(&ctx, &resolve_jobs(&["all"]).unwrap()).unwrap();
    assert!(report.is_success(), "failed jobs: {:?}", report.failed());
    sinks
}

#[test]
fn test_window_size_does_not_change_output() {
    let small = run_all(1);
    let large = run_all(1_000_000);
    for name in job_names() {
        let expected = large.collection(name);
        assert!(!expected.is_empty(), "{name} is empty");
        assert_eq!(small.collection(name), expected, "{name} differs");
    }
}

#[test]
fn test_memory_pressure_commits_between_windows() {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(expression_source(), &sinks, test_config(2)).with_probes(Arc::new(|| {
        Box::new(ScriptedMemoryProbe::constant(0.95)) as Box<dyn MemoryProbe>
    }));
    let report = job_by_name(result::NAME).unwrap().run(&ctx).unwrap();

    assert!(report.stats.windows > 1);
    assert_eq!(report.stats.pressure_commits, report.stats.windows);
    assert_eq!(sinks.collection(result::NAME), run_all(2).collection(result::NAME));
}

#[test]
fn test_rebuild_replaces_previous_collection() {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(expression_source(), &sinks, test_config(10));
    job_by_name(result::NAME).unwrap().run(&ctx).unwrap();
    assert_eq!(sinks.collection(result::NAME).len(), 7);

    let mut source = expression_source();
    source
        .insert_rows::<RnaSeqMeasurementRow>(Table::RnaSeqMeasurement, &[])
        .unwrap();
    let ctx = memory_context(source, &sinks, test_config(10));
    let report = job_by_name(result::NAME).unwrap().run(&ctx).unwrap();
    assert_eq!(report.stats.documents, 4);
    assert_eq!(
        ids(&sinks.collection(result::NAME)),
        vec![
            "Immunohistochemistry-3",
            "Immunohistochemistry-6",
            "RNA in situ-1",
            "RNA in situ-2",
        ]
    );
}

#[test]
fn test_failed_rebuild_keeps_published_collection() {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(expression_source(), &sinks, test_config(10));
    job_by_name(dag_edge::NAME).unwrap().run(&ctx).unwrap();

    let mut source = expression_source();
    source.remove(Table::DagClosure);
    let ctx = memory_context(source, &sinks, test_config(10));
    assert!(job_by_name(dag_edge::NAME).unwrap().run(&ctx).is_err());
    assert_eq!(sinks.collection(dag_edge::NAME).len(), 7);
}

#[test]
fn test_unreadable_facet_is_left_out() {
    let mut source = expression_source();
    // wrong columns for a header table
    source
        .insert_rows(
            Table::MarkerGoBpHeader,
            &[MarkerSynonymRow {
                marker_key: gxd_indexer::model::MarkerKey(10),
                synonym: "not a header".to_string(),
            }],
        )
        .unwrap();
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(source, &sinks, test_config(10));
    let report = job_by_name(result::NAME).unwrap().run(&ctx).unwrap();
    assert_eq!(report.stats.documents, 7);

    let documents = sinks.collection(result::NAME);
    let doc = find(&documents, "RNA in situ-1");
    assert_eq!(list(doc, "mp_header"), vec!["vision/eye"]);
    assert!(doc.get("go_bp_header").is_none());
    assert_eq!(doc.text(fields::MARKER_SYMBOL), Some("Pax6"));
}
