//! Job orchestration
//!
//! Runs the selected jobs on a bounded `rayon` pool, one job per worker, and
//! waits for all of them while logging which jobs are still running. A job
//! that returns an error or panics is recorded as failed; its siblings keep
//! running.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use itertools::Itertools;

use crate::error::{IndexerError, Result};
use crate::jobs::{IndexJob, JobContext, JobReport};

/// Result of one job
#[derive(Debug)]
pub struct JobOutcome {
    pub name: &'static str,
    pub result: Result<JobReport>,
}

impl JobOutcome {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results of every job in a run, in the order the jobs were requested
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<JobOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether every job succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::succeeded)
    }

    /// Names of the jobs that failed
    #[must_use]
    pub fn failed(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.name)
            .collect()
    }

    /// Documents written by the successful jobs
    #[must_use]
    pub fn documents(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.stats.documents)
            .sum()
    }
}

/// Run jobs concurrently, at most `max_threads` at a time
///
/// # Errors
/// Fails only when the worker pool cannot be created; job failures are
/// reported through the returned [`RunReport`].
pub fn run_jobs(ctx: &JobContext, jobs: &[Arc<dyn IndexJob>]) -> Result<RunReport> {
    let start = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ctx.config.max_threads)
        .thread_name(|i| format!("gxd-job-{i}"))
        .build()
        .map_err(|e| IndexerError::Config(format!("cannot start worker pool: {e}")))?;
    log::info!(
        "Running {} jobs on {} workers",
        jobs.len(),
        ctx.config.max_threads
    );

    let (tx, rx) = mpsc::channel::<JobOutcome>();
    for job in jobs {
        let job = Arc::clone(job);
        let ctx = ctx.clone();
        let tx = tx.clone();
        pool.spawn(move || {
            let name = job.name();
            log::info!("Starting job {name}");
            let result = panic::catch_unwind(AssertUnwindSafe(|| job.run(&ctx))).unwrap_or_else(
                |payload| {
                    Err(IndexerError::Job {
                        name: name.to_string(),
                        message: panic_message(payload.as_ref()),
                    })
                },
            );
            if tx.send(JobOutcome { name, result }).is_err() {
                log::error!("Job {name} finished after the orchestrator stopped waiting");
            }
        });
    }
    drop(tx);

    let interval = Duration::from_secs(ctx.config.liveness_interval_secs.max(1));
    let mut finished: Vec<JobOutcome> = Vec::with_capacity(jobs.len());
    while finished.len() < jobs.len() {
        match rx.recv_timeout(interval) {
            Ok(outcome) => {
                match &outcome.result {
                    Ok(report) => log::info!(
                        "Job {} finished: {} documents in {:?}",
                        outcome.name,
                        report.stats.documents,
                        report.elapsed
                    ),
                    Err(e) => log::error!("Job {} failed: {e}", outcome.name),
                }
                finished.push(outcome);
            }
            Err(RecvTimeoutError::Timeout) => {
                let running = jobs
                    .iter()
                    .map(|j| j.name())
                    .filter(|name| !finished.iter().any(|o| o.name == *name))
                    .join(", ");
                log::info!("Still running after {:?}: {running}", start.elapsed());
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let mut outcomes = Vec::with_capacity(jobs.len());
    for job in jobs {
        let name = job.name();
        match finished.iter().position(|o| o.name == name) {
            Some(pos) => outcomes.push(finished.swap_remove(pos)),
            None => outcomes.push(JobOutcome {
                name,
                result: Err(IndexerError::Job {
                    name: name.to_string(),
                    message: "worker exited without reporting".to_string(),
                }),
            }),
        }
    }

    let report = RunReport {
        outcomes,
        elapsed: start.elapsed(),
    };
    if report.is_success() {
        log::info!("All {} jobs succeeded in {:?}", jobs.len(), report.elapsed);
    } else {
        log::error!("Failed jobs: {}", report.failed().iter().join(", "));
    }
    Ok(report)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "job panicked".to_string()
    }
}
