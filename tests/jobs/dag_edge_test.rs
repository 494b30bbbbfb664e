use gxd_indexer::jobs::dag_edge;
use gxd_indexer::model::{FieldValue, fields};
use gxd_indexer::{MemorySinkFactory, Table, job_by_name};

use crate::utils::{anatomy_source, find, ids, list, memory_context, test_config};

#[test]
fn test_direct_and_descendant_edges() {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(anatomy_source(), &sinks, test_config(3));
    let report = job_by_name(dag_edge::NAME).unwrap().run(&ctx).unwrap();
    let documents = sinks.collection(dag_edge::NAME);

    // EMAPS edges, the reflexive brain row and the cell type term never
    // produce documents
    assert_eq!(
        ids(&documents),
        vec![
            "EMAPA_descendant_201",
            "EMAPA_descendant_202",
            "EMAPA_descendant_203",
            "EMAPA_descendant_204",
            "EMAPA_direct_301",
            "EMAPA_direct_302",
            "EMAPA_direct_303",
        ]
    );
    assert_eq!(report.stats.documents, 7);

    // embryo to forebrain
    let edge = find(&documents, "EMAPA_descendant_203");
    assert_eq!(edge.text(fields::EDGE_TYPE), Some("descendant"));
    assert_eq!(edge.text(fields::VOCAB), Some("EMAPA"));
    assert_eq!(edge.get(fields::ANCESTOR_KEY), Some(&FieldValue::Int(1)));
    assert_eq!(edge.get(fields::DESCENDANT_KEY), Some(&FieldValue::Int(4)));
    assert_eq!(edge.text(fields::ANCESTOR_ID), Some("EMAPA:1"));
    assert_eq!(edge.text(fields::DESCENDANT_TERM), Some("forebrain"));
    assert_eq!(edge.get(fields::DESCENDANT_START_STAGE), Some(&FieldValue::Int(12)));
    assert_eq!(edge.get(fields::ANCESTOR_END_STAGE), Some(&FieldValue::Int(28)));
    assert_eq!(list(edge, fields::VALID_EMAPS_IDS), vec!["EMAPS:103"]);
    assert!(edge.get(fields::RELATED_ANCESTORS).is_none());

    // embryo to brain
    let brain = find(&documents, "EMAPA_direct_301");
    assert_eq!(list(brain, fields::VALID_EMAPS_IDS), vec!["EMAPS:102", "EMAPS:106"]);
    assert_eq!(list(brain, fields::RELATED_DESCENDANTS), vec!["EMAPA:4"]);
    assert!(brain.get(fields::RELATED_ANCESTORS).is_none());

    // brain to forebrain
    let forebrain = find(&documents, "EMAPA_direct_303");
    assert_eq!(forebrain.get(fields::ANCESTOR_KEY), Some(&FieldValue::Int(2)));
    assert_eq!(list(forebrain, fields::RELATED_ANCESTORS), vec!["EMAPA:1"]);
    assert!(forebrain.get(fields::RELATED_DESCENDANTS).is_none());
}

#[test]
fn test_without_edge_table() {
    let mut source = anatomy_source();
    source.remove(Table::DagEdge);
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(source, &sinks, test_config(1000));
    job_by_name(dag_edge::NAME).unwrap().run(&ctx).unwrap();
    let documents = sinks.collection(dag_edge::NAME);
    assert!(documents.iter().all(|d| d.id().starts_with("EMAPA_descendant_")));
    assert_eq!(documents.len(), 4);
}
