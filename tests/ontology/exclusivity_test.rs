use std::collections::BTreeSet;

use gxd_indexer::exclusivity::ExclusivityPhase;
use gxd_indexer::model::{Document, Stage, TermKey, fields};
use gxd_indexer::{ClosureBuilder, MarkerExclusivity, TermClosureIndex};

use crate::utils::{
    BRAIN, BRAIN_TS12, BRAIN_TS20, EMBRYO, FOREBRAIN_TS12, HEART, HEART_TS12, anatomy_source, list,
};

fn index() -> TermClosureIndex {
    ClosureBuilder::new(1000).build(&anatomy_source()).unwrap()
}

fn keys(keys: &[i64]) -> BTreeSet<TermKey> {
    keys.iter().map(|k| TermKey(*k)).collect()
}

#[test]
fn test_exclusive_structures_per_stage() {
    let index = index();
    let mut state = MarkerExclusivity::new();
    assert_eq!(state.phase(), ExclusivityPhase::NoData);
    state.observe_structure(&index, TermKey(FOREBRAIN_TS12)).unwrap();
    state.observe_structure(&index, TermKey(BRAIN_TS12)).unwrap();
    state.observe_structure(&index, TermKey(BRAIN_TS20)).unwrap();
    assert_eq!(state.phase(), ExclusivityPhase::Accumulating);

    let summary = state.finalize();
    assert_eq!(summary.per_stage(Stage(12)), Some(&keys(&[EMBRYO, BRAIN])));
    assert_eq!(summary.per_stage(Stage(20)), Some(&keys(&[EMBRYO, BRAIN])));
    assert_eq!(summary.all_stages(), keys(&[EMBRYO, BRAIN]));
    assert_eq!(summary.exclusive_stages(), vec![Stage(12), Stage(20)]);
}

#[test]
fn test_divergent_stages_only_share_the_root() {
    let index = index();
    let mut state = MarkerExclusivity::new();
    state.observe_structure(&index, TermKey(HEART_TS12)).unwrap();
    state.observe_structure(&index, TermKey(BRAIN_TS20)).unwrap();
    let summary = state.finalize();

    assert_eq!(summary.per_stage(Stage(12)), Some(&keys(&[EMBRYO, HEART])));
    assert_eq!(summary.per_stage(Stage(20)), Some(&keys(&[EMBRYO, BRAIN])));
    assert_eq!(summary.all_stages(), keys(&[EMBRYO]));
    assert_eq!(summary.cross_stage(), &keys(&[EMBRYO]));
    assert_eq!(summary.any_stage().len(), 4);
}

#[test]
fn test_fields_written_to_document() {
    let index = index();
    let mut state = MarkerExclusivity::new();
    state.observe_structure(&index, TermKey(HEART_TS12)).unwrap();
    let mut document = Document::new("m");
    state.finalize().apply(&mut document, &index);

    assert_eq!(
        list(&document, fields::EXCLUSIVE_ANY_STAGE),
        vec!["TS12:EMAPA:1", "TS12:EMAPA:3"]
    );
    assert_eq!(
        list(&document, fields::EXCLUSIVE_ALL_STAGES),
        vec!["EMAPA:1", "EMAPA:3"]
    );
    assert_eq!(
        document.get(fields::EXCLUSIVE_STAGES),
        Some(&gxd_indexer::FieldValue::IntList(vec![12]))
    );
}

#[test]
fn test_no_positive_results() {
    let index = index();
    let mut document = Document::new("m");
    MarkerExclusivity::new().finalize().apply(&mut document, &index);
    assert!(document.get(fields::EXCLUSIVE_ALL_STAGES).is_none());
    assert!(document.get(fields::EXCLUSIVE_STAGES).is_none());
}

#[test]
fn test_unknown_structure_is_an_error() {
    let index = index();
    let mut state = MarkerExclusivity::new();
    assert!(state.observe_structure(&index, TermKey(BRAIN)).is_err());
    assert_eq!(state.phase(), ExclusivityPhase::NoData);
}
