use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::SourceFile;

/// Errors raised while enumerating source files.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The input path does not exist, or is neither a file nor a directory.
    #[error("invalid input path: {}", .path.display())]
    InvalidInput { path: PathBuf },
}

fn normalized_extensions(settings: &LibrarySettings) -> Vec<String> {
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn has_source_extension(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Enumerate source files under `input`.
///
/// A single file yields itself when its extension matches, otherwise nothing.
/// A directory is walked (recursively unless configured otherwise) in file-name
/// order, so repeated scans of an unchanged tree return the same sequence.
pub fn discover(input: &Path, settings: &LibrarySettings) -> Result<Vec<SourceFile>, DiscoveryError> {
    let exts = normalized_extensions(settings);

    let meta = fs::metadata(input).map_err(|_| DiscoveryError::InvalidInput {
        path: input.to_path_buf(),
    })?;

    if meta.is_file() {
        if has_source_extension(input, &exts) {
            return Ok(vec![SourceFile::new(input, meta.len())]);
        }
        return Ok(Vec::new());
    }

    if !meta.is_dir() {
        return Err(DiscoveryError::InvalidInput {
            path: input.to_path_buf(),
        });
    }

    let mut walker = WalkDir::new(input)
        .follow_links(settings.follow_links)
        .sort_by_file_name();

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut files = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_file() && has_source_extension(path, &exts) {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(SourceFile::new(path, size));
        }
    }

    debug!(input = %input.display(), count = files.len(), "discovery finished");
    Ok(files)
}
