//! Output path policy: one fresh folder per source file.

use std::path::{Path, PathBuf};

/// First of `root/desired`, `root/desired(1)`, `root/desired(2)`, ... that does not exist yet.
///
/// Only reads the filesystem; the caller creates the folder.
pub fn unique_subfolder(root: &Path, desired: &str) -> PathBuf {
    let candidate = root.join(desired);
    if !candidate.exists() {
        return candidate;
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = root.join(format!("{desired}({counter})"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
