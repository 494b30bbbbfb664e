//! Logging utilities for output and progress tracking

pub mod console;
pub mod log;
pub mod progress;

pub use console::{print_job_list, print_run_summary};
pub use log::{log_operation_complete, log_operation_start, log_warning};
pub use progress::{create_main_progress_bar, create_spinner, finish_progress_bar};
