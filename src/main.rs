use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use log::info;

use gxd_indexer::utils::logging::{
    create_spinner, finish_progress_bar, print_job_list, print_run_summary,
};
use gxd_indexer::{
    IndexerConfig, JobContext, JsonLinesSinkFactory, ParquetFactSource, resolve_jobs, run_jobs,
};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

/// Rebuild gene expression search collections from Parquet fact tables
#[derive(Debug, Parser)]
#[command(name = "gxd-indexer", version, about)]
struct Cli {
    /// Jobs to run; `all` selects every job, `list` prints the job names
    #[arg(required = true)]
    jobs: Vec<String>,

    /// Maximum number of jobs running at once
    #[arg(long, short = 't')]
    max_threads: Option<usize>,

    /// Directory holding one Parquet file per fact table
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory receiving one JSON-lines file per collection
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,

    /// Memory the process may use, in MiB, before windows force a commit
    #[arg(long)]
    max_memory_mb: Option<u64>,

    /// JSON configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Draw progress bars
    #[arg(long)]
    progress: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<IndexerConfig> {
        let mut config = match &self.config {
            Some(path) => IndexerConfig::from_file(path)
                .with_context(|| format!("reading configuration {}", path.display()))?,
            None => IndexerConfig::default(),
        }
        .with_env_overrides();

        if let Some(threads) = self.max_threads {
            config.max_threads = threads;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir.clone_from(dir);
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(mb) = self.max_memory_mb {
            config.max_memory_mb = Some(mb);
        }
        if self.progress {
            config.show_progress = true;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.jobs.iter().any(|job| job == "list") {
        print_job_list();
        return Ok(());
    }

    let config = cli.load_config()?;
    let jobs = resolve_jobs(&cli.jobs)?;
    info!(
        "Indexing {} job(s) from {} into {}",
        jobs.len(),
        config.data_dir.display(),
        config.output_dir.display()
    );

    let source = ParquetFactSource::open(&config.data_dir)
        .with_context(|| format!("opening fact tables in {}", config.data_dir.display()))?
        .with_batch_size(config.scan_batch_size);
    let sinks = JsonLinesSinkFactory::new(&config.output_dir);
    let show_progress = config.show_progress;
    let ctx = JobContext::new(config, Arc::new(source), Arc::new(sinks));

    let spinner = create_spinner(Some("Indexing"), show_progress);
    let report = run_jobs(&ctx, &jobs)?;
    finish_progress_bar(&spinner, Some("Indexing finished"));

    print_run_summary(&report);
    if !report.is_success() {
        bail!("failed jobs: {}", report.failed().join(", "));
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
