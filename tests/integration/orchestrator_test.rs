use std::sync::Arc;

use gxd_indexer::jobs::{dag_edge, result};
use gxd_indexer::source::FactSource;
use gxd_indexer::{
    ChunkedPipeline, IndexJob, IndexerError, JobContext, MemorySinkFactory, PipelineStats,
    Result, Table, job_by_name, resolve_jobs, run_jobs,
};

use crate::utils::{expression_source, memory_context, test_config};

struct PanickingJob;

impl IndexJob for PanickingJob {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn collection(&self) -> &'static str {
        "panicking"
    }

    fn populate(
        &self,
        _ctx: &JobContext,
        _source: &dyn FactSource,
        _pipeline: &mut ChunkedPipeline<'_>,
    ) -> Result<PipelineStats> {
        panic!("window cache exploded")
    }
}

#[test]
fn test_failed_job_does_not_stop_siblings() {
    let mut source = expression_source();
    source.remove(Table::Assay);
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(source, &sinks, test_config(5));

    let jobs = resolve_jobs(&[result::NAME, dag_edge::NAME]).unwrap();
    let report = run_jobs(&ctx, &jobs).unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed(), vec![result::NAME]);
    assert_eq!(report.outcomes[0].name, result::NAME);
    assert!(matches!(
        report.outcomes[0].result,
        Err(IndexerError::MissingTable(ref table)) if table == "assay"
    ));
    assert_eq!(report.documents(), 7);
    assert_eq!(sinks.collection(dag_edge::NAME).len(), 7);
    assert!(sinks.collection(result::NAME).is_empty());
}

#[test]
fn test_panicking_job_is_reported() {
    let sinks = MemorySinkFactory::new();
    let ctx = memory_context(expression_source(), &sinks, test_config(5));
    let jobs: Vec<Arc<dyn IndexJob>> = vec![Arc::new(PanickingJob), job_by_name(dag_edge::NAME).unwrap()];
    let report = run_jobs(&ctx, &jobs).unwrap();

    assert_eq!(report.failed(), vec!["panicking"]);
    match &report.outcomes[0].result {
        Err(IndexerError::Job { name, message }) => {
            assert_eq!(name, "panicking");
            assert!(message.contains("window cache exploded"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(report.outcomes[1].succeeded());
}

#[test]
fn test_outcomes_follow_request_order() {
    let sinks = MemorySinkFactory::new();
    let mut config = test_config(50);
    config.max_threads = 1;
    let ctx = memory_context(expression_source(), &sinks, config);
    let jobs = resolve_jobs(&["all"]).unwrap();
    let report = run_jobs(&ctx, &jobs).unwrap();

    let names: Vec<&str> = report.outcomes.iter().map(|o| o.name).collect();
    let requested: Vec<&str> = jobs.iter().map(|j| j.name()).collect();
    assert_eq!(names, requested);
    assert!(report.is_success());
}

#[test]
fn test_unknown_job_name() {
    assert!(matches!(
        resolve_jobs(&["gxdResult", "gxdMissing"]),
        Err(IndexerError::UnknownJob(name)) if name == "gxdMissing"
    ));
}
