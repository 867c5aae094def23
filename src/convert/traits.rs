//! Trait definitions for the convert module.

use std::path::Path;

use super::error::ConvertError;
use super::types::AudioFormat;

/// One decode-then-encode strategy taking part in the fallback chain.
///
/// Implementations are moved onto the worker thread and called one file at a
/// time, so they need `Send` but not `Sync`.
pub trait Converter: Send {
    /// Name used to prefix diagnostics.
    fn name(&self) -> &str;

    /// Format written to `output`, or `None` when the backend cannot produce audio.
    fn output_format(&self) -> Option<AudioFormat>;

    /// Convert `input` into `output`. `output` already carries the format's extension.
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError>;
}
