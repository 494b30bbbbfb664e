//! Configuration for indexing runs.
//!
//! Values are layered: defaults, then an optional JSON file, then environment
//! overrides, then whatever the command line sets explicitly.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{IndexerError, Result};

/// Default number of documents buffered before a flush to the sink
pub const DEFAULT_BUFFER_SIZE: usize = 1200;

/// Default fraction of memory in use above which a window forces a commit
pub const DEFAULT_MEMORY_HIGH_WATER: f64 = 0.80;

/// Default number of rows per record batch when reading Parquet files
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 16384;

/// Window sizes per job, in keys of the job's primary table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChunkSizes {
    /// Classical expression results
    pub classical: i64,
    /// RNA-seq measurements
    pub rnaseq: i64,
    /// Classical results for the has-image collection
    pub has_image: i64,
    /// EMAPA terms for DAG edge documents
    pub dag_edge: i64,
    /// Markers for marker-level aggregates
    pub marker: i64,
    /// Consolidated RNA-seq samples
    pub sample: i64,
    /// Image panes
    pub image_pane: i64,
    /// Term key ranges used while building the closure index
    pub closure: i64,
}

impl Default for ChunkSizes {
    fn default() -> Self {
        Self {
            classical: 100_000,
            rnaseq: 500_000,
            has_image: 50_000,
            dag_edge: 150_000,
            marker: 2_000,
            sample: 100_000,
            image_pane: 15_000,
            closure: 150_000,
        }
    }
}

impl ChunkSizes {
    /// Use the same window size for every job
    #[must_use]
    pub const fn uniform(size: i64) -> Self {
        Self {
            classical: size,
            rnaseq: size,
            has_image: size,
            dag_edge: size,
            marker: size,
            sample: size,
            image_pane: size,
            closure: size,
        }
    }

    fn all(&self) -> [(&'static str, i64); 8] {
        [
            ("classical", self.classical),
            ("rnaseq", self.rnaseq),
            ("has_image", self.has_image),
            ("dag_edge", self.dag_edge),
            ("marker", self.marker),
            ("sample", self.sample),
            ("image_pane", self.image_pane),
            ("closure", self.closure),
        ]
    }
}

/// Configuration for an indexing run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Directory holding one Parquet file per fact table
    pub data_dir: PathBuf,
    /// Directory receiving one JSON-lines file per collection
    pub output_dir: PathBuf,
    /// Size of the job worker pool
    pub max_threads: usize,
    /// Documents buffered before a flush
    pub buffer_size: usize,
    /// Memory utilization ratio that forces a commit between windows
    pub memory_high_water: f64,
    /// Memory the process may use, in MiB; total host memory when unset
    pub max_memory_mb: Option<u64>,
    /// Rows per record batch when scanning Parquet files
    pub scan_batch_size: usize,
    /// Whether to draw progress bars for the window loop
    pub show_progress: bool,
    /// Seconds between liveness messages while waiting on jobs
    pub liveness_interval_secs: u64,
    /// Window sizes per job
    pub chunk_sizes: ChunkSizes,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("index"),
            max_threads: num_cpus::get(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            memory_high_water: DEFAULT_MEMORY_HIGH_WATER,
            max_memory_mb: None,
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
            show_progress: false,
            liveness_interval_secs: 60,
            chunk_sizes: ChunkSizes::default(),
        }
    }
}

impl IndexerConfig {
    /// Load a configuration from a JSON file, falling back to defaults for
    /// any field the file omits
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Apply `GXD_*` environment overrides
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(size) = env_value::<i64>("GXD_CHUNK_SIZE") {
            self.chunk_sizes = ChunkSizes::uniform(size);
        }
        if let Some(size) = env_value("GXD_BUFFER_SIZE") {
            self.buffer_size = size;
        }
        if let Some(threads) = env_value("GXD_MAX_THREADS") {
            self.max_threads = threads;
        }
        if let Some(mb) = env_value("GXD_MAX_MEMORY_MB") {
            self.max_memory_mb = Some(mb);
        }
        if let Some(size) = env_value("PARQUET_BATCH_SIZE") {
            self.scan_batch_size = size;
        }
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        for (name, size) in self.chunk_sizes.all() {
            if size < 1 {
                return Err(IndexerError::Config(format!(
                    "chunk size for {name} must be at least 1, got {size}"
                )));
            }
        }
        if self.buffer_size == 0 {
            return Err(IndexerError::Config("buffer_size must be at least 1".into()));
        }
        if self.max_threads == 0 {
            return Err(IndexerError::Config("max_threads must be at least 1".into()));
        }
        if !(self.memory_high_water > 0.0 && self.memory_high_water <= 1.0) {
            return Err(IndexerError::Config(format!(
                "memory_high_water must lie in (0, 1], got {}",
                self.memory_high_water
            )));
        }
        if self.max_memory_mb == Some(0) {
            return Err(IndexerError::Config("max_memory_mb must be at least 1".into()));
        }
        Ok(())
    }

    /// Memory ceiling in bytes, if configured
    #[must_use]
    pub fn memory_ceiling_bytes(&self) -> Option<u64> {
        self.max_memory_mb.map(|mb| mb.saturating_mul(1024 * 1024))
    }
}

fn env_value<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}
