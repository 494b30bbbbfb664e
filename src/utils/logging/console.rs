//! Console output utilities
//!
//! Plain-text summaries printed by the binary once a run has finished.

use crate::jobs::job_names;
use crate::orchestrator::RunReport;

/// Print one line per job with its document count or failure
pub fn print_run_summary(report: &RunReport) {
    println!("Indexing finished in {:?}", report.elapsed);
    let width = report
        .outcomes
        .iter()
        .map(|o| o.name.len())
        .max()
        .unwrap_or(0);
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(job) => println!(
                "  {:<width$}  ok      {:>10} documents  {:>6} skipped  started {}  took {:?}",
                outcome.name,
                job.stats.documents,
                job.stats.skipped,
                job.started_at.format("%Y-%m-%d %H:%M:%S"),
                job.elapsed
            ),
            Err(e) => println!("  {:<width$}  FAILED  {e}", outcome.name),
        }
    }
    println!("Total documents: {}", report.documents());
}

/// Print the names of the available jobs
pub fn print_job_list() {
    println!("Available jobs:");
    for name in job_names() {
        println!("  {name}");
    }
    println!("  all");
}
