//! Application model types: `App`, `RunState` and `FileStatus`.
//!
//! The `App` struct holds the discovered files, the per-file conversion state
//! and the run lifecycle used by the UI and runtime. It only ever changes on
//! the UI thread, fed by `WorkerEvent`s drained from the batch worker.

use std::path::PathBuf;

use crate::batch::{BatchReport, Stage, WorkerEvent};
use crate::convert::{Backend, Capabilities, FileResult};
use crate::library::SourceFile;

/// Lifecycle of one conversion run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    CancelRequested,
    Completed,
}

impl RunState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::CancelRequested => "Cancelling",
            Self::Completed => "Completed",
        }
    }
}

/// Per-file state shown in the file list.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum FileStatus {
    #[default]
    Pending,
    Converting,
    Converted(String),
    Failed(String),
    /// Never attempted because the run was cancelled or aborted.
    Skipped,
}

impl FileStatus {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Pending => "[ ]",
            Self::Converting => "[~]",
            Self::Converted(_) => "[x]",
            Self::Failed(_) => "[!]",
            Self::Skipped => "[-]",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Converted(s) | Self::Failed(s) => Some(s),
            _ => None,
        }
    }
}

/// One-line description of a probed backend for the status box.
pub fn backend_summary(backend: &Backend) -> String {
    match (backend.available, backend.kind.output_format()) {
        (true, Some(format)) => format!("{} ({format})", backend.kind),
        (true, None) => format!("{} (metadata only)", backend.kind),
        (false, _) => format!(
            "{} (off: {})",
            backend.kind,
            backend.detail.as_deref().unwrap_or("unavailable")
        ),
    }
}

/// The main application model.
pub struct App {
    pub files: Vec<SourceFile>,
    pub statuses: Vec<FileStatus>,
    pub selected: usize,
    pub follow_progress: bool,

    pub state: RunState,
    /// Completed share of the batch in `0.0..=1.0`.
    pub progress: f64,
    pub status_text: String,
    pub report: Option<BatchReport>,
    /// Set when the batch stopped on a batch-level error.
    pub aborted: Option<String>,

    pub backends: Vec<String>,
    pub warnings: Vec<String>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary_window: bool,
}

impl App {
    /// Create a new `App` for the discovered `files`.
    pub fn new(files: Vec<SourceFile>, input: PathBuf, output: PathBuf) -> Self {
        let statuses = vec![FileStatus::Pending; files.len()];
        let status_text = if files.is_empty() {
            "no source files found".to_string()
        } else {
            format!("{} file(s) ready", files.len())
        };

        Self {
            files,
            statuses,
            selected: 0,
            follow_progress: true,

            state: RunState::Idle,
            progress: 0.0,
            status_text,
            report: None,
            aborted: None,

            backends: Vec::new(),
            warnings: Vec::new(),
            input,
            output,
            summary_window: false,
        }
    }

    /// Record the probed backends and any reduced-capability warnings.
    pub fn set_capabilities(&mut self, caps: &Capabilities) {
        self.backends = caps.backends().iter().map(backend_summary).collect();
        self.warnings = caps.warnings();
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn can_start(&self) -> bool {
        self.state == RunState::Idle && self.has_files()
    }

    /// Move from `Idle` to `Running`. Returns `false` when a run cannot start.
    pub fn start(&mut self) -> bool {
        if !self.can_start() {
            return false;
        }
        self.state = RunState::Running;
        self.status_text = "starting".to_string();
        true
    }

    /// Move from `Running` to `CancelRequested`. Returns `true` only on that transition.
    pub fn request_cancel(&mut self) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        self.state = RunState::CancelRequested;
        self.status_text = "cancelling after the current file".to_string();
        true
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, RunState::Running | RunState::CancelRequested)
    }

    /// Fold one worker event into the model.
    pub fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Progress(p) => {
                self.progress = p.fraction();
                self.status_text = p.status.clone();
                if let Some(slot) = self.statuses.get_mut(p.index) {
                    *slot = match p.stage {
                        Stage::Started => FileStatus::Converting,
                        Stage::Finished if !p.converted => FileStatus::Failed(p.status),
                        Stage::Finished => FileStatus::Converted(p.status),
                    };
                }
                if self.follow_progress && p.index < self.files.len() {
                    self.selected = p.index;
                }
            }
            WorkerEvent::Finished(report) => {
                for (slot, entry) in self.statuses.iter_mut().zip(&report.entries) {
                    *slot = match &entry.result {
                        FileResult::Converted { .. } => {
                            FileStatus::Converted(entry.result.status_text())
                        }
                        FileResult::Failed(_) => {
                            FileStatus::Failed(entry.result.diagnostic_trail())
                        }
                    };
                }
                self.mark_unattempted_skipped(report.attempted());
                self.status_text = report.headline();
                self.report = Some(report);
                self.state = RunState::Completed;
                self.summary_window = true;
            }
            WorkerEvent::Aborted(reason) => {
                let attempted = self
                    .statuses
                    .iter()
                    .take_while(|s| !matches!(s, FileStatus::Pending | FileStatus::Converting))
                    .count();
                self.mark_unattempted_skipped(attempted);
                self.status_text = format!("aborted: {reason}");
                self.aborted = Some(reason);
                self.state = RunState::Completed;
                self.summary_window = true;
            }
        }
    }

    fn mark_unattempted_skipped(&mut self, attempted: usize) {
        for slot in self.statuses.iter_mut().skip(attempted) {
            *slot = FileStatus::Skipped;
        }
    }

    /// Lines for the end-of-run popup: headline, then every failure with its diagnostics.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(reason) = &self.aborted {
            lines.push(format!("batch aborted: {reason}"));
        }
        if let Some(report) = &self.report {
            lines.extend(report.summary_lines());
        }
        lines
    }

    pub fn toggle_summary_window(&mut self) {
        if self.state == RunState::Completed {
            self.summary_window = !self.summary_window;
        }
    }

    /// Select the next file (wraps around).
    pub fn next(&mut self) {
        if self.has_files() {
            self.follow_progress = false;
            self.selected = (self.selected + 1) % self.files.len();
        }
    }

    /// Select the previous file (wraps around).
    pub fn prev(&mut self) {
        if self.has_files() {
            self.follow_progress = false;
            self.selected = if self.selected == 0 {
                self.files.len() - 1
            } else {
                self.selected - 1
            };
        }
    }

    pub fn follow_progress_on(&mut self) {
        self.follow_progress = true;
    }
}
