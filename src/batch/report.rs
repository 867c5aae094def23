//! Progress events and the end-of-run report.

use crate::convert::FileResult;
use crate::library::SourceFile;

/// Whether a progress event is emitted before or after converting a file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Started,
    Finished,
}

/// One progress update from the batch runner.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Zero-based position of the file in the batch.
    pub index: usize,
    pub total: usize,
    pub file_name: String,
    pub stage: Stage,
    pub status: String,
    /// Set on `Finished` when the file produced an output; always `false` on `Started`.
    pub converted: bool,
}

impl Progress {
    /// Completed share of the batch in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        let done = match self.stage {
            Stage::Started => self.index,
            Stage::Finished => self.index + 1,
        };
        (done as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub source: SourceFile,
    pub result: FileResult,
}

/// Outcome of one run over the discovered files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Files handed to the runner, attempted or not.
    pub planned: usize,
    /// One entry per attempted file, in processing order.
    pub entries: Vec<FileReport>,
    /// The run stopped early on request.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn new(planned: usize) -> Self {
        Self {
            planned,
            ..Self::default()
        }
    }

    pub fn attempted(&self) -> usize {
        self.entries.len()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_converted()).count()
    }

    /// Files that converted to a format other than the requested one.
    pub fn substituted(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, FileResult::Converted { substituted: true, .. }))
            .count()
    }

    /// Failed files with their diagnostic trails, in processing order.
    pub fn failures(&self) -> Vec<(&SourceFile, String)> {
        self.entries
            .iter()
            .filter(|e| !e.result.is_converted())
            .map(|e| (&e.source, e.result.diagnostic_trail()))
            .collect()
    }

    /// Converted files that only succeeded after earlier backends failed.
    pub fn recovered(&self) -> Vec<(&SourceFile, String)> {
        self.entries
            .iter()
            .filter(|e| e.result.is_converted() && !e.result.diagnostics().is_empty())
            .map(|e| (&e.source, e.result.diagnostic_trail()))
            .collect()
    }

    /// Every planned file was attempted and converted.
    pub fn is_full_success(&self) -> bool {
        !self.cancelled && self.attempted() == self.planned && self.succeeded() == self.planned
    }

    /// One-line outcome for status bars and logs.
    pub fn headline(&self) -> String {
        let failed = self.attempted() - self.succeeded();
        let mut line = if failed == 0 {
            format!("converted {} of {} file(s)", self.succeeded(), self.planned)
        } else {
            format!(
                "converted {} of {} file(s), {} failed",
                self.succeeded(),
                self.planned,
                failed
            )
        };
        if self.substituted() > 0 {
            line.push_str(&format!(", {} as fallback format", self.substituted()));
        }
        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        line
    }

    /// Headline, then every failed file and every file rescued by a later
    /// backend, each with its diagnostic trail.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![self.headline()];
        for (title, group) in [
            ("failed files:", self.failures()),
            ("converted after fallback:", self.recovered()),
        ] {
            if group.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(title.to_string());
            for (source, trail) in group {
                lines.push(format!("{}: {trail}", source.file_name()));
            }
        }
        lines
    }
}
