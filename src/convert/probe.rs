//! Startup capability probe.
//!
//! Resolves which backends can run on this machine, once, and fixes their
//! priority order for the rest of the process.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::{BackendSettings, Settings};

use super::error::ProbeError;
use super::ffmpeg::{self, FfmpegConverter, FfmpegStatus};
use super::tags::LoftyProbe;
use super::traits::Converter;
use super::types::{AudioFormat, Backend, BackendKind};
use super::wav::RodioWavConverter;

/// Probed backends in priority order. Immutable once built.
#[derive(Debug, Clone)]
pub struct Capabilities {
    backends: Vec<Backend>,
}

fn resolve(kind: BackendKind, settings: &BackendSettings) -> Backend {
    let enabled = settings
        .enabled
        .iter()
        .any(|name| BackendKind::from(*name) == kind);
    if !enabled {
        return Backend::disabled(kind);
    }

    match kind {
        BackendKind::Ffmpeg => match ffmpeg::detect(
            &settings.ffmpeg_path,
            Duration::from_secs(settings.probe_timeout_secs),
        ) {
            FfmpegStatus::Ready => Backend::available(kind),
            FfmpegStatus::MissingEncoder => Backend::unavailable(
                kind,
                format!("ffmpeg has no {} encoder", ffmpeg::MP3_ENCODER),
            ),
            FfmpegStatus::NotRunnable(reason) => Backend::unavailable(kind, reason),
        },
        // Compiled in; nothing to resolve at runtime.
        BackendKind::Rodio | BackendKind::Lofty => Backend::available(kind),
    }
}

impl Capabilities {
    /// Probe every known backend against `settings`.
    pub fn probe(settings: &BackendSettings) -> Result<Self, ProbeError> {
        let backends = BackendKind::ALL
            .iter()
            .map(|&kind| resolve(kind, settings))
            .collect();
        let caps = Self::from_backends(backends)?;

        for b in &caps.backends {
            if b.available {
                info!(backend = %b.kind, "backend available");
            } else {
                warn!(backend = %b.kind, detail = b.detail.as_deref().unwrap_or(""), "backend unavailable");
            }
        }
        Ok(caps)
    }

    /// Order `backends` by priority and check that at least one can convert.
    pub fn from_backends(mut backends: Vec<Backend>) -> Result<Self, ProbeError> {
        backends.sort_by_key(|b| b.kind.rank());

        let usable = backends.iter().any(|b| b.available && b.kind.can_convert());
        if !usable {
            let details = backends
                .iter()
                .map(|b| match (&b.detail, b.available) {
                    (Some(d), _) => format!("{}: {}", b.kind, d),
                    (None, true) => format!("{}: metadata only", b.kind),
                    (None, false) => format!("{}: unavailable", b.kind),
                })
                .collect();
            return Err(ProbeError::NoBackendAvailable { details });
        }

        Ok(Self { backends })
    }

    /// Every probed backend, available or not, in priority order.
    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    pub fn available(&self) -> impl Iterator<Item = &Backend> {
        self.backends.iter().filter(|b| b.available)
    }

    /// Best format any available backend can write.
    pub fn best_format(&self) -> Option<AudioFormat> {
        self.available().find_map(|b| b.kind.output_format())
    }

    /// Warnings for backends that were enabled but could not be resolved.
    pub fn warnings(&self) -> Vec<String> {
        self.backends
            .iter()
            .filter(|b| b.enabled && !b.available)
            .map(|b| {
                let detail = b.detail.as_deref().unwrap_or("unavailable");
                match b.kind.output_format() {
                    Some(AudioFormat::Mp3) => format!(
                        "{}: {detail}; MP3 output is unavailable, files will fall back to other backends",
                        b.kind
                    ),
                    _ => format!("{}: {detail}", b.kind),
                }
            })
            .collect()
    }

    /// Instantiate the available backends, in priority order.
    pub fn build_converters(&self, settings: &Settings) -> Vec<Box<dyn Converter>> {
        self.available()
            .map(|b| -> Box<dyn Converter> {
                match b.kind {
                    BackendKind::Ffmpeg => {
                        Box::new(FfmpegConverter::new(&settings.backends, &settings.convert))
                    }
                    BackendKind::Rodio => Box::new(RodioWavConverter::new(&settings.convert)),
                    BackendKind::Lofty => Box::new(LoftyProbe),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendName;
    use std::path::PathBuf;

    fn without_ffmpeg() -> BackendSettings {
        BackendSettings {
            ffmpeg_path: PathBuf::from("/definitely/not/here/ffmpeg"),
            ..BackendSettings::default()
        }
    }

    #[test]
    fn probe_orders_by_rank_regardless_of_config_order() {
        let settings = BackendSettings {
            enabled: vec![BackendName::Lofty, BackendName::Rodio, BackendName::Ffmpeg],
            ..without_ffmpeg()
        };
        let caps = Capabilities::probe(&settings).unwrap();
        let kinds: Vec<BackendKind> = caps.backends().iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![BackendKind::Ffmpeg, BackendKind::Rodio, BackendKind::Lofty]
        );
    }

    #[test]
    fn missing_ffmpeg_degrades_to_wav_with_warning() {
        let caps = Capabilities::probe(&without_ffmpeg()).unwrap();
        let available: Vec<BackendKind> = caps.available().map(|b| b.kind).collect();
        assert_eq!(available, vec![BackendKind::Rodio, BackendKind::Lofty]);
        assert_eq!(caps.best_format(), Some(AudioFormat::Wav));

        let warnings = caps.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("ffmpeg:"));
    }

    #[test]
    fn metadata_only_is_not_enough() {
        let settings = BackendSettings {
            enabled: vec![BackendName::Lofty],
            ..without_ffmpeg()
        };
        let err = Capabilities::probe(&settings).unwrap_err();
        let ProbeError::NoBackendAvailable { details } = err;
        assert!(details.iter().any(|d| d == "lofty: metadata only"));
        assert!(details.iter().any(|d| d == "rodio: disabled in config"));
    }

    #[test]
    fn nothing_enabled_is_fatal() {
        let settings = BackendSettings {
            enabled: Vec::new(),
            ..without_ffmpeg()
        };
        assert!(Capabilities::probe(&settings).is_err());
    }

    #[test]
    fn disabled_backends_do_not_warn_and_are_not_built() {
        let settings = Settings {
            backends: BackendSettings {
                enabled: vec![BackendName::Rodio],
                ..without_ffmpeg()
            },
            ..Settings::default()
        };
        let caps = Capabilities::probe(&settings.backends).unwrap();
        assert!(caps.warnings().is_empty());
        assert!(caps.backends().iter().all(|b| b.enabled == (b.kind == BackendKind::Rodio)));

        let converters = caps.build_converters(&settings);
        let names: Vec<&str> = converters.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["rodio"]);
    }

    #[test]
    fn warnings_depend_on_enablement_not_detail_text() {
        let caps = Capabilities::from_backends(vec![
            Backend::unavailable(BackendKind::Ffmpeg, "disabled in config"),
            Backend::disabled(BackendKind::Lofty),
            Backend::available(BackendKind::Rodio),
        ])
        .unwrap();

        let warnings = caps.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("ffmpeg: disabled in config; MP3 output is unavailable"));
    }
}
