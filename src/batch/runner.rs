//! Sequential batch runner.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, warn};

use crate::convert::{ConversionChain, Diagnostic, FileResult};
use crate::library::SourceFile;

use super::paths::unique_subfolder;
use super::report::{BatchReport, FileReport, Progress, Stage};

const WRITE_PROBE_NAME: &str = ".oggshift-write-test.tmp";

/// Failures that stop a batch as a whole, as opposed to per-file failures.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no source files to convert")]
    NoSourceFiles,

    #[error("output folder is not writable: {} ({reason})", .path.display())]
    DestinationNotWritable { path: PathBuf, reason: String },

    #[error("output folder disappeared during the batch: {}", .path.display())]
    DestinationLost { path: PathBuf },
}

/// Check that `root` is an existing, writable directory by writing and removing a probe file.
pub fn check_destination(root: &Path) -> Result<(), BatchError> {
    let not_writable = |reason: String| BatchError::DestinationNotWritable {
        path: root.to_path_buf(),
        reason,
    };

    match fs::metadata(root) {
        Ok(m) if m.is_dir() => {}
        Ok(_) => return Err(not_writable("not a directory".to_string())),
        Err(e) => return Err(not_writable(e.to_string())),
    }

    let probe = root.join(WRITE_PROBE_NAME);
    fs::write(&probe, b"test").map_err(|e| not_writable(e.to_string()))?;
    fs::remove_file(&probe).map_err(|e| not_writable(e.to_string()))?;
    Ok(())
}

fn remove_if_empty(folder: &Path) {
    let is_empty = match fs::read_dir(folder) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => return,
    };
    if is_empty {
        if let Err(e) = fs::remove_dir(folder) {
            warn!(folder = %folder.display(), error = %e, "could not remove empty output folder");
        }
    }
}

/// Convert `source` into a fresh subfolder of `destination_root`.
fn convert_into_subfolder(
    source: &SourceFile,
    chain: &ConversionChain,
    destination_root: &Path,
) -> FileResult {
    let stem = source.stem();
    let folder = unique_subfolder(destination_root, &stem);
    if let Err(e) = fs::create_dir_all(&folder) {
        return FileResult::Failed(vec![Diagnostic::new(
            "output",
            format!("cannot create {}: {e}", folder.display()),
        )]);
    }

    let result = chain.convert_one(source, &folder.join(&stem));
    if !result.is_converted() {
        remove_if_empty(&folder);
    }
    result
}

/// Convert `files` one at a time, in order.
///
/// `cancel` is read before each file; once set, no further file is started.
/// `on_progress` sees a `Started` and a `Finished` event for every attempted
/// file. Per-file failures land in the report; only destination problems
/// return `Err`.
pub fn run_batch<F>(
    files: &[SourceFile],
    chain: &ConversionChain,
    destination_root: &Path,
    cancel: &AtomicBool,
    mut on_progress: F,
) -> Result<BatchReport, BatchError>
where
    F: FnMut(&Progress),
{
    if files.is_empty() {
        return Err(BatchError::NoSourceFiles);
    }
    check_destination(destination_root)?;

    let total = files.len();
    let mut report = BatchReport::new(total);
    info!(total, destination = %destination_root.display(), backends = ?chain.backend_names(), "batch started");

    for (index, source) in files.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            report.cancelled = true;
            info!(done = index, total, "batch cancelled");
            break;
        }
        if !destination_root.is_dir() {
            return Err(BatchError::DestinationLost {
                path: destination_root.to_path_buf(),
            });
        }

        let file_name = source.file_name();
        on_progress(&Progress {
            index,
            total,
            file_name: file_name.clone(),
            stage: Stage::Started,
            status: format!("converting {file_name}"),
            converted: false,
        });

        let result = convert_into_subfolder(source, chain, destination_root);
        match &result {
            FileResult::Converted { path, backend, .. } => {
                info!(source = %source.path.display(), output = %path.display(), %backend, "file converted")
            }
            FileResult::Failed(_) => {
                warn!(source = %source.path.display(), diagnostics = %result.diagnostic_trail(), "file failed")
            }
        }

        on_progress(&Progress {
            index,
            total,
            file_name,
            stage: Stage::Finished,
            status: result.status_text(),
            converted: result.is_converted(),
        });

        report.entries.push(FileReport {
            source: source.clone(),
            result,
        });
    }

    info!(summary = %report.headline(), "batch finished");
    Ok(report)
}
