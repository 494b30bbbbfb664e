use gxd_indexer::jobs::consolidated_sample;
use gxd_indexer::model::{FieldValue, fields};
use gxd_indexer::{MemorySinkFactory, job_by_name};

use crate::utils::{expression_source, find, ids, list, memory_context, test_config};

#[test]
fn test_consolidated_samples() {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(expression_source(), &sinks, test_config(1));
    let report = job_by_name(consolidated_sample::NAME).unwrap().run(&ctx).unwrap();
    let documents = sinks.collection(consolidated_sample::NAME);

    assert_eq!(ids(&documents), vec!["800", "801"]);
    assert_eq!(report.stats.skipped, 0);

    let wild = find(&documents, "800");
    assert_eq!(wild.get(fields::SAMPLE_KEY), Some(&FieldValue::Int(800)));
    assert_eq!(wild.text(fields::EXPERIMENT_TITLE), Some("Embryonic atlas"));
    assert_eq!(wild.text(fields::SEX), Some("Female"));
    assert_eq!(wild.text(fields::STRUCTURE_EXACT), Some("EMAPS:102"));
    assert_eq!(list(wild, fields::STRUCTURE_SYNONYMS), vec!["encephalon"]);
    assert_eq!(list(wild, fields::ANATOMICAL_SYSTEM), vec!["nervous system"]);
    assert_eq!(wild.text(fields::IS_WILD_TYPE), Some(gxd_indexer::assemble::WILD_TYPE));
    assert_eq!(wild.text(fields::JNUM_ID), Some("J:900"));
    assert!(wild.get(fields::RESULT_NOTE).is_none());

    let mutant = find(&documents, "801");
    assert_eq!(mutant.text(fields::IS_WILD_TYPE), Some(gxd_indexer::assemble::MUTANT));
    assert_eq!(mutant.text(fields::RESULT_NOTE), Some("Conditional mutant. treated"));
}
