use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{self, LogSettings};

fn env_filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Where TUI-mode logs go.
fn log_file_path(settings: &LogSettings) -> Option<PathBuf> {
    settings.file.clone().or_else(config::default_log_path)
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
///
/// Headless runs log to stderr. The TUI owns the terminal, so its logs are
/// appended to a file; when that file cannot be opened nothing is installed
/// and events are dropped.
pub fn init(settings: &LogSettings, headless: bool) {
    let filter = env_filter(settings);

    if headless {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
        return;
    }

    let Some(file) = log_file_path(settings).and_then(|p| open_log_file(&p).ok()) else {
        return;
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn configured_file_wins_over_default() {
        let settings = LogSettings {
            level: "debug".into(),
            file: Some(PathBuf::from("/tmp/custom.log")),
        };
        assert_eq!(log_file_path(&settings), Some(PathBuf::from("/tmp/custom.log")));
    }

    #[test]
    fn log_file_parent_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("oggshift.log");
        open_log_file(&path).unwrap();
        assert!(path.is_file());
    }
}
