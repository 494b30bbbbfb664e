use std::fs;
use std::sync::Arc;

use gxd_indexer::jobs::result;
use gxd_indexer::scan::{MemoryProbe, ScriptedMemoryProbe};
use gxd_indexer::source::parquet::write_table;
use gxd_indexer::{
    IndexerError, JobContext, JsonLinesSinkFactory, MemorySinkFactory, ParquetFactSource, Table,
    job_by_name, job_names, resolve_jobs, run_jobs,
};

use crate::utils::{expression_source, memory_context, test_config};

/// Write every table of the expression fixture under `dir`
fn write_fixture(dir: &std::path::Path) {
    let source = expression_source();
    for table in Table::ALL {
        if let Some(batches) = source.batches(table) {
            write_table(dir, table, batches).unwrap();
        }
    }
}

fn low_memory() -> Arc<dyn Fn() -> Box<dyn MemoryProbe> + Send + Sync> {
    Arc::new(|| Box::new(ScriptedMemoryProbe::constant(0.1)) as Box<dyn MemoryProbe>)
}

#[test]
fn test_parquet_source_matches_memory_source() {
    let data = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    let parquet = ParquetFactSource::open(data.path()).unwrap().with_batch_size(2);

    let from_parquet = MemorySinkFactory::new();
    let ctx = JobContext::new(test_config(3), Arc::new(parquet), Arc::new(from_parquet.clone()))
        .with_probes(low_memory());
    let report = run_jobs(&ctx, &resolve_jobs(&["all"]).unwrap()).unwrap();
    assert!(report.is_success(), "failed jobs: {:?}", report.failed());

    let from_memory = MemorySinkFactory::new();
    let ctx = memory_context(expression_source(), &from_memory, test_config(3));
    run_jobs(&ctx, &resolve_jobs(&["all"]).unwrap()).unwrap();

    for name in job_names() {
        assert_eq!(from_parquet.collection(name), from_memory.collection(name), "{name} differs");
    }
}

#[test]
fn test_missing_parquet_table() {
    let data = tempfile::tempdir().unwrap();
    let source = ParquetFactSource::open(data.path()).unwrap();
    let sinks = MemorySinkFactory::new();
    let ctx = JobContext::new(test_config(10), Arc::new(source), Arc::new(sinks)).with_probes(low_memory());
    let err = job_by_name(result::NAME).unwrap().run(&ctx).unwrap_err();
    assert!(matches!(err, IndexerError::MissingTable(_)), "unexpected error {err}");
}

#[test]
fn test_missing_data_directory() {
    let data = tempfile::tempdir().unwrap();
    assert!(ParquetFactSource::open(data.path().join("absent")).is_err());
}

#[test]
fn test_json_lines_output() {
    let data = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_fixture(data.path());

    let source = ParquetFactSource::open(data.path()).unwrap();
    let sinks = JsonLinesSinkFactory::new(output.path());
    let ctx = JobContext::new(test_config(2), Arc::new(source), Arc::new(sinks)).with_probes(low_memory());
    job_by_name(result::NAME).unwrap().run(&ctx).unwrap();

    let published = output.path().join(format!("{}.jsonl", result::NAME));
    let text = fs::read_to_string(&published).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 7);
    assert!(lines.iter().any(|doc| doc["id"] == "RNA in situ-1"));
    assert!(lines.iter().all(|doc| doc["marker_symbol"].is_string()));
    assert!(!output.path().join(format!(".{}.jsonl.staging", result::NAME)).exists());
}
