//! Batch conversion: output folder policy, the sequential runner and the
//! background worker that hosts it.

mod paths;
mod report;
mod runner;
mod worker;

pub use report::{BatchReport, FileReport, Progress, Stage};
pub use runner::{BatchError, check_destination, run_batch};
pub use worker::{BatchWorker, WorkerEvent};
