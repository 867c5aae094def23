//! Error types for the convert module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors a single backend attempt can raise. The chain turns every one of
/// these into a diagnostic; none escape `ConversionChain::convert_one`.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Encoder binary could not be spawned.
    #[error("encoder not found at path: {}", .path.display())]
    EncoderNotFound { path: PathBuf },

    /// Encoder process ran but exited unsuccessfully.
    #[error("encoder exited with {status}{}", stderr_suffix(.stderr))]
    EncoderFailed { status: String, stderr: String },

    /// The source could not be decoded.
    #[error("decode failed: {reason}")]
    Decode { reason: String },

    /// The source decoded to zero samples.
    #[error("decoded audio is empty")]
    EmptyAudio,

    /// The output could not be written.
    #[error("encode failed: {reason}")]
    Encode { reason: String },

    /// The backend only reads metadata and cannot produce audio.
    #[error("metadata-only backend cannot encode audio ({detail})")]
    MetadataOnly { detail: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let line = stderr.lines().rev().find(|l| !l.trim().is_empty());
    match line {
        Some(l) => format!(": {}", l.trim()),
        None => String::new(),
    }
}

impl ConvertError {
    pub fn decode(reason: impl ToString) -> Self {
        Self::Decode {
            reason: reason.to_string(),
        }
    }

    pub fn encode(reason: impl ToString) -> Self {
        Self::Encode {
            reason: reason.to_string(),
        }
    }
}

/// Startup capability probe failures.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Nothing that can actually convert audio is available.
    #[error("no conversion backend available ({})", .details.join("; "))]
    NoBackendAvailable { details: Vec<String> },
}
