//! MP3 encoding through an external `ffmpeg` process.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{BackendSettings, ConvertSettings};

use super::error::ConvertError;
use super::traits::Converter;
use super::types::AudioFormat;

/// Encoder ffmpeg must list for MP3 output.
pub const MP3_ENCODER: &str = "libmp3lame";

pub struct FfmpegConverter {
    ffmpeg_path: PathBuf,
    log_level: String,
    bitrate_kbps: u32,
    quality: u8,
}

impl FfmpegConverter {
    pub fn new(backends: &BackendSettings, convert: &ConvertSettings) -> Self {
        Self {
            ffmpeg_path: backends.ffmpeg_path.clone(),
            log_level: backends.ffmpeg_log_level.clone(),
            bitrate_kbps: convert.mp3_bitrate_kbps,
            quality: convert.mp3_quality,
        }
    }

    /// Builds ffmpeg arguments for an OGG -> MP3 conversion.
    fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-c:a".to_string(),
            MP3_ENCODER.to_string(),
            "-b:a".to_string(),
            format!("{}k", self.bitrate_kbps),
            "-q:a".to_string(),
            self.quality.to_string(),
            "-map_metadata".to_string(),
            "0".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
            output.to_string_lossy().to_string(),
        ]
    }
}

impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn output_format(&self) -> Option<AudioFormat> {
        Some(AudioFormat::Mp3)
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let args = self.build_args(input, output);
        debug!(ffmpeg = %self.ffmpeg_path.display(), ?args, "running ffmpeg");

        let result = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::EncoderNotFound {
                        path: self.ffmpeg_path.clone(),
                    }
                } else {
                    ConvertError::Io(e)
                }
            })?;

        if !result.status.success() {
            return Err(ConvertError::EncoderFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).to_string(),
            });
        }

        Ok(())
    }
}

/// Outcome of asking an ffmpeg binary which encoders it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FfmpegStatus {
    Ready,
    MissingEncoder,
    NotRunnable(String),
}

const DETECT_POLL: Duration = Duration::from_millis(20);

/// Run `ffmpeg -encoders` and check for the MP3 encoder.
///
/// A binary that has not exited after `timeout` is killed and reported as not runnable.
pub fn detect(ffmpeg_path: &Path, timeout: Duration) -> FfmpegStatus {
    let spawned = Command::new(ffmpeg_path)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return FfmpegStatus::NotRunnable(format!("{} not found", ffmpeg_path.display()));
        }
        Err(e) => return FfmpegStatus::NotRunnable(e.to_string()),
    };

    // Drained on its own thread so a full pipe cannot stall the child.
    let reader = child.stdout.take().map(|mut stdout| {
        thread::spawn(move || {
            let mut listing = String::new();
            let _ = stdout.read_to_string(&mut listing);
            listing
        })
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                debug!(ffmpeg = %ffmpeg_path.display(), ?timeout, "encoder listing timed out");
                return FfmpegStatus::NotRunnable(format!("`-encoders` timed out after {timeout:?}"));
            }
            Ok(None) => thread::sleep(DETECT_POLL),
            Err(e) => {
                let _ = child.kill();
                return FfmpegStatus::NotRunnable(e.to_string());
            }
        }
    };

    if !status.success() {
        return FfmpegStatus::NotRunnable(format!("`-encoders` exited with {status}"));
    }
    let listing = reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    if encoders_list_mp3(&listing) {
        FfmpegStatus::Ready
    } else {
        FfmpegStatus::MissingEncoder
    }
}

fn encoders_list_mp3(listing: &str) -> bool {
    listing
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(MP3_ENCODER))
}
