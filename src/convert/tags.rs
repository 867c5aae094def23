//! Metadata-only backend.
//!
//! Reads the source with `lofty` so the diagnostic says whether the file is at
//! least a readable audio container, then always fails: it has no encoder.

use std::path::Path;

use lofty::prelude::*;

use super::error::ConvertError;
use super::traits::Converter;
use super::types::AudioFormat;

#[derive(Default)]
pub struct LoftyProbe;

impl Converter for LoftyProbe {
    fn name(&self) -> &str {
        "lofty"
    }

    fn output_format(&self) -> Option<AudioFormat> {
        None
    }

    fn convert(&self, input: &Path, _output: &Path) -> Result<(), ConvertError> {
        let tagged = lofty::read_from_path(input).map_err(ConvertError::decode)?;
        let props = tagged.properties();

        let mut detail = format!("{:.1}s", props.duration().as_secs_f64());
        if let Some(rate) = props.sample_rate() {
            detail.push_str(&format!(", {rate} Hz"));
        }
        if let Some(channels) = props.channels() {
            detail.push_str(&format!(", {channels} ch"));
        }

        Err(ConvertError::MetadataOnly { detail })
    }
}
