use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/oggshift/config.toml` or `~/.config/oggshift/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `OGGSHIFT__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub convert: ConvertSettings,
    pub backends: BackendSettings,
    pub ui: UiSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions treated as convertible sources (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConvertSettings {
    /// Destination root used when `--output` is not given.
    pub output_dir: Option<PathBuf>,
    /// Accept output in a format other than MP3 (WAV) when no MP3 encoder succeeds.
    pub accept_fallback_format: bool,
    /// Constant bitrate handed to the MP3 encoder.
    pub mp3_bitrate_kbps: u32,
    /// LAME VBR quality (0 best, 9 worst).
    pub mp3_quality: u8,
    /// Sample width of the WAV fallback output.
    pub wav_bits_per_sample: u16,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            accept_fallback_format: true,
            mp3_bitrate_kbps: 192,
            mp3_quality: 2,
            wav_bits_per_sample: 16,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendName {
    #[serde(alias = "ffmpeg-mp3", alias = "mp3")]
    Ffmpeg,
    #[serde(alias = "wav")]
    Rodio,
    #[serde(alias = "tags")]
    Lofty,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Backends allowed to take part in the chain. Order here does not change priority.
    pub enabled: Vec<BackendName>,
    /// Path (or bare name resolved via `PATH`) of the ffmpeg binary.
    pub ffmpeg_path: PathBuf,
    /// Value passed to ffmpeg's `-loglevel`.
    pub ffmpeg_log_level: String,
    /// Upper bound on the startup `ffmpeg -encoders` check, in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            enabled: vec![BackendName::Ffmpeg, BackendName::Rodio, BackendName::Lofty],
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffmpeg_log_level: "error".to_string(),
            probe_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Whether the status box lists the probed backends.
    pub show_backends: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ ogg in, mp3 out ~ ".to_string(),
            show_backends: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Log file used while the TUI owns the terminal.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
