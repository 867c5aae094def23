//! Uncompressed fallback: decode with `rodio`, write PCM WAV with `hound`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, Source};
use tracing::debug;

use crate::config::ConvertSettings;

use super::error::ConvertError;
use super::traits::Converter;
use super::types::AudioFormat;

pub struct RodioWavConverter {
    bits_per_sample: u16,
}

impl RodioWavConverter {
    pub fn new(convert: &ConvertSettings) -> Self {
        Self {
            bits_per_sample: convert.wav_bits_per_sample,
        }
    }
}

/// Scale a normalized float sample to a signed integer of `bits` width.
fn quantize(sample: f32, bits: u16) -> i32 {
    let max = ((1i64 << (bits - 1)) - 1) as f32;
    (sample.clamp(-1.0, 1.0) * max).round() as i32
}

/// Share of the advertised length a decode must reach to count as complete.
const MIN_DECODED_SHARE: f64 = 0.9;

/// Interleaved sample count implied by a stream's advertised duration.
fn expected_samples(duration: Option<Duration>, sample_rate: u32, channels: u16) -> Option<u64> {
    let duration = duration?;
    let samples = duration.as_secs_f64() * f64::from(sample_rate) * f64::from(channels);
    (samples >= 1.0).then_some(samples as u64)
}

/// The decoder stops quietly on a corrupt packet, so a short count is the only sign of it.
fn check_sample_count(written: u64, expected: Option<u64>) -> Result<(), ConvertError> {
    if written == 0 {
        return Err(ConvertError::EmptyAudio);
    }
    match expected {
        Some(expected) if (written as f64) < expected as f64 * MIN_DECODED_SHARE => {
            Err(ConvertError::decode(format!(
                "stream ended early: {written} of ~{expected} samples"
            )))
        }
        _ => Ok(()),
    }
}

impl Converter for RodioWavConverter {
    fn name(&self) -> &str {
        "rodio"
    }

    fn output_format(&self) -> Option<AudioFormat> {
        Some(AudioFormat::Wav)
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let file = File::open(input)?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(ConvertError::decode)?;

        let spec = hound::WavSpec {
            channels: u16::from(decoder.channels()),
            sample_rate: u32::from(decoder.sample_rate()),
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        };
        let expected = expected_samples(decoder.total_duration(), spec.sample_rate, spec.channels);
        debug!(?spec, ?expected, output = %output.display(), "writing wav");

        let mut writer = hound::WavWriter::create(output, spec).map_err(ConvertError::encode)?;
        let mut written: u64 = 0;
        for sample in decoder {
            writer
                .write_sample(quantize(sample, self.bits_per_sample))
                .map_err(ConvertError::encode)?;
            written += 1;
        }
        writer.finalize().map_err(ConvertError::encode)?;

        check_sample_count(written, expected)
    }
}
