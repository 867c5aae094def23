//! Backend, format and outcome types shared by the conversion chain.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::BackendName;

/// Output formats a backend can produce.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AudioFormat {
    /// MPEG Audio Layer III
    Mp3,
    /// WAVE (uncompressed PCM)
    Wav,
}

impl AudioFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    /// `<base>.<ext>`, appended rather than replaced so stems containing dots survive.
    pub fn output_path(&self, base: &Path) -> PathBuf {
        let mut s: OsString = base.as_os_str().to_owned();
        s.push(".");
        s.push(self.extension());
        PathBuf::from(s)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The fixed set of conversion strategies, listed in priority order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BackendKind {
    /// External `ffmpeg` process encoding MP3 with LAME.
    Ffmpeg,
    /// In-process decode with rodio, written out as WAV.
    Rodio,
    /// Tag/property inspection only; never produces audio.
    Lofty,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [Self::Ffmpeg, Self::Rodio, Self::Lofty];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ffmpeg => "ffmpeg",
            Self::Rodio => "rodio",
            Self::Lofty => "lofty",
        }
    }

    /// Format this backend writes, or `None` for metadata-only backends.
    pub fn output_format(&self) -> Option<AudioFormat> {
        match self {
            Self::Ffmpeg => Some(AudioFormat::Mp3),
            Self::Rodio => Some(AudioFormat::Wav),
            Self::Lofty => None,
        }
    }

    /// Lower is tried first: direct MP3 encoders, then uncompressed output, then metadata-only.
    pub fn rank(&self) -> u8 {
        match self.output_format() {
            Some(AudioFormat::Mp3) => 0,
            Some(AudioFormat::Wav) => 1,
            None => 2,
        }
    }

    pub fn can_convert(&self) -> bool {
        self.output_format().is_some()
    }
}

impl From<BackendName> for BackendKind {
    fn from(name: BackendName) -> Self {
        match name {
            BackendName::Ffmpeg => Self::Ffmpeg,
            BackendName::Rodio => Self::Rodio,
            BackendName::Lofty => Self::Lofty,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A backend together with its availability, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub kind: BackendKind,
    /// Listed in `backends.enabled`.
    pub enabled: bool,
    pub available: bool,
    /// Why the backend is unavailable (or a short note when it is).
    pub detail: Option<String>,
}

impl Backend {
    pub fn available(kind: BackendKind) -> Self {
        Self {
            kind,
            enabled: true,
            available: true,
            detail: None,
        }
    }

    /// Enabled, but it could not be resolved on this machine.
    pub fn unavailable(kind: BackendKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            enabled: true,
            available: false,
            detail: Some(detail.into()),
        }
    }

    /// Left out of `backends.enabled`; never probed.
    pub fn disabled(kind: BackendKind) -> Self {
        Self {
            kind,
            enabled: false,
            available: false,
            detail: Some("disabled in config".to_string()),
        }
    }
}

/// Result of one (source, backend) attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Success(PathBuf),
    Failure(String),
}

/// Why one backend (or the precondition check) failed for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub backend: String,
    pub message: String,
}

impl Diagnostic {
    pub const PRECONDITION: &'static str = "precondition";

    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(Self::PRECONDITION, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.message)
    }
}

/// Result of pushing one source file through the whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    Converted {
        path: PathBuf,
        format: AudioFormat,
        backend: String,
        /// The produced format differs from the requested target.
        substituted: bool,
        /// Backends that failed before this one succeeded, in the order tried.
        failed_attempts: Vec<Diagnostic>,
    },
    Failed(Vec<Diagnostic>),
}

impl FileResult {
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    /// Every failed attempt for this file; for a conversion, the backends tried before the winner.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Converted {
                failed_attempts, ..
            } => failed_attempts,
            Self::Failed(d) => d,
        }
    }

    /// All diagnostics joined into one line, e.g. `ffmpeg: ...; rodio: ...`.
    pub fn diagnostic_trail(&self) -> String {
        self.diagnostics()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Short status text for progress reporting.
    pub fn status_text(&self) -> String {
        match self {
            Self::Converted {
                format,
                substituted: false,
                ..
            } => format!("converted to {format}"),
            Self::Converted {
                format,
                substituted: true,
                ..
            } => format!("converted to {format} (fallback format)"),
            Self::Failed(_) => "failed".to_string(),
        }
    }
}

/// Which output formats count as success.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FormatPolicy {
    pub target: AudioFormat,
    pub accept_fallback: bool,
}

impl FormatPolicy {
    pub fn accepts(&self, format: AudioFormat) -> bool {
        format == self.target || self.accept_fallback
    }
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            target: AudioFormat::Mp3,
            accept_fallback: true,
        }
    }
}
