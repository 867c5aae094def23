use super::*;
use crate::library::SourceFile;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

/// What a `FakeConverter` does when asked to convert.
#[derive(Clone)]
pub(crate) enum Behavior {
    Fail(&'static str),
    Write(&'static [u8]),
    /// Claims success without producing a file.
    NoOutput,
    /// Claims success after writing a zero-byte file.
    WriteEmpty,
    /// Writes a partial file, then errors.
    PartialThenFail,
}

pub(crate) struct FakeConverter {
    pub name: &'static str,
    pub format: Option<AudioFormat>,
    pub behavior: Behavior,
    pub calls: Arc<AtomicUsize>,
}

impl FakeConverter {
    pub fn new(name: &'static str, format: Option<AudioFormat>, behavior: Behavior) -> Self {
        Self {
            name,
            format,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Converter for FakeConverter {
    fn name(&self) -> &str {
        self.name
    }

    fn output_format(&self) -> Option<AudioFormat> {
        self.format
    }

    fn convert(&self, _input: &Path, output: &Path) -> Result<(), ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Fail(msg) => Err(ConvertError::encode(msg)),
            Behavior::Write(bytes) => {
                fs::write(output, bytes)?;
                Ok(())
            }
            Behavior::NoOutput => Ok(()),
            Behavior::WriteEmpty => {
                fs::write(output, b"")?;
                Ok(())
            }
            Behavior::PartialThenFail => {
                fs::write(output, b"partial")?;
                Err(ConvertError::encode("interrupted"))
            }
        }
    }
}

pub(crate) fn chain_of(converters: Vec<FakeConverter>) -> ConversionChain {
    let boxed = converters
        .into_iter()
        .map(|c| Box::new(c) as Box<dyn Converter>)
        .collect();
    ConversionChain::new(boxed, FormatPolicy::default())
}

fn source_with(dir: &Path, name: &str, bytes: &[u8]) -> SourceFile {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    SourceFile::new(path, bytes.len() as u64)
}

#[test]
fn falls_back_to_second_backend() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");
    let base = dir.path().join("a");

    let chain = chain_of(vec![
        FakeConverter::new("first", Some(AudioFormat::Mp3), Behavior::Fail("boom")),
        FakeConverter::new("second", Some(AudioFormat::Mp3), Behavior::Write(b"mp3")),
    ]);

    let result = chain.convert_one(&source, &base);
    assert_eq!(
        result.diagnostics(),
        &[Diagnostic::new("first", "encode failed: boom")]
    );
    match result {
        FileResult::Converted {
            path,
            format,
            backend,
            substituted,
            ..
        } => {
            assert_eq!(path, dir.path().join("a.mp3"));
            assert_eq!(format, AudioFormat::Mp3);
            assert_eq!(backend, "second");
            assert!(!substituted);
            assert_eq!(fs::read(&path).unwrap(), b"mp3");
        }
        other => panic!("expected conversion, got {other:?}"),
    }
}

#[test]
fn stops_at_first_success() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");

    let winner = FakeConverter::new("winner", Some(AudioFormat::Mp3), Behavior::Write(b"x"));
    let never = FakeConverter::new("never", Some(AudioFormat::Wav), Behavior::Write(b"y"));
    let never_calls = never.calls.clone();

    let chain = chain_of(vec![winner, never]);
    let result = chain.convert_one(&source, &dir.path().join("a"));
    assert!(result.is_converted());
    assert!(result.diagnostics().is_empty());
    assert_eq!(never_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn all_failures_keep_one_diagnostic_per_backend() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");

    let chain = chain_of(vec![
        FakeConverter::new("one", Some(AudioFormat::Mp3), Behavior::Fail("no encoder")),
        FakeConverter::new("two", Some(AudioFormat::Wav), Behavior::Fail("bad stream")),
        FakeConverter::new("three", None, Behavior::Fail("metadata only")),
    ]);

    let result = chain.convert_one(&source, &dir.path().join("a"));
    let diagnostics = result.diagnostics();
    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics[0].backend, "one");
    assert_eq!(diagnostics[1].backend, "two");
    assert_eq!(diagnostics[2].backend, "three");
    assert!(result.diagnostic_trail().starts_with("one: encode failed: no encoder; two: "));
}

#[test]
fn claimed_success_without_output_is_failure() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");

    let chain = chain_of(vec![FakeConverter::new(
        "liar",
        Some(AudioFormat::Mp3),
        Behavior::NoOutput,
    )]);

    let result = chain.convert_one(&source, &dir.path().join("a"));
    assert_eq!(
        result,
        FileResult::Failed(vec![Diagnostic::new("liar", "output file is missing or empty")])
    );
}

#[test]
fn zero_byte_output_is_failure_and_removed() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");

    let chain = chain_of(vec![FakeConverter::new(
        "empty",
        Some(AudioFormat::Mp3),
        Behavior::WriteEmpty,
    )]);

    let result = chain.convert_one(&source, &dir.path().join("a"));
    assert!(!result.is_converted());
    assert!(!dir.path().join("a.mp3").exists());
}

#[test]
fn partial_output_is_removed_after_error() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");

    let chain = chain_of(vec![FakeConverter::new(
        "partial",
        Some(AudioFormat::Wav),
        Behavior::PartialThenFail,
    )]);

    assert!(!chain.convert_one(&source, &dir.path().join("a")).is_converted());
    assert!(!dir.path().join("a.wav").exists());
}

#[test]
fn empty_source_fails_precondition_without_calling_backends() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "c.ogg", b"");

    let backend = FakeConverter::new("any", Some(AudioFormat::Mp3), Behavior::Write(b"x"));
    let calls = backend.calls.clone();
    let chain = chain_of(vec![backend]);

    let result = chain.convert_one(&source, &dir.path().join("c"));
    assert_eq!(result.diagnostic_trail(), "precondition: input file is empty");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_source_fails_precondition() {
    let dir = tempdir().unwrap();
    let source = SourceFile::new(dir.path().join("gone.ogg"), 10);

    let chain = chain_of(vec![FakeConverter::new(
        "any",
        Some(AudioFormat::Mp3),
        Behavior::Write(b"x"),
    )]);

    let result = chain.convert_one(&source, &dir.path().join("gone"));
    assert_eq!(
        result.diagnostic_trail(),
        "precondition: input file does not exist"
    );
}

#[test]
fn wav_fallback_is_labelled_as_substituted() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");

    let chain = chain_of(vec![FakeConverter::new(
        "wav",
        Some(AudioFormat::Wav),
        Behavior::Write(b"RIFF"),
    )]);

    let result = chain.convert_one(&source, &dir.path().join("a"));
    assert_eq!(
        result,
        FileResult::Converted {
            path: dir.path().join("a.wav"),
            format: AudioFormat::Wav,
            backend: "wav".to_string(),
            substituted: true,
            failed_attempts: Vec::new(),
        }
    );
    assert_eq!(result.status_text(), "converted to wav (fallback format)");
}

#[test]
fn strict_policy_skips_fallback_backends() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");

    let wav = FakeConverter::new("wav", Some(AudioFormat::Wav), Behavior::Write(b"RIFF"));
    let calls = wav.calls.clone();
    let chain = ConversionChain::new(
        vec![Box::new(wav) as Box<dyn Converter>],
        FormatPolicy {
            target: AudioFormat::Mp3,
            accept_fallback: false,
        },
    );

    let result = chain.convert_one(&source, &dir.path().join("a"));
    assert_eq!(
        result.diagnostic_trail(),
        "wav: produces wav, but only mp3 output is accepted"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("a.wav").exists());
}

#[test]
fn metadata_only_backend_never_succeeds() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");

    // Even a metadata-only backend that reports Ok must not count as a conversion.
    let chain = chain_of(vec![FakeConverter::new("tags", None, Behavior::NoOutput)]);
    let result = chain.convert_one(&source, &dir.path().join("a"));
    assert_eq!(
        result.diagnostic_trail(),
        "tags: backend cannot produce audio"
    );
}

#[test]
fn wav_fallback_remembers_why_mp3_failed() {
    let dir = tempdir().unwrap();
    let source = source_with(dir.path(), "a.ogg", b"ogg data");

    let chain = chain_of(vec![
        FakeConverter::new("ffmpeg", Some(AudioFormat::Mp3), Behavior::Fail("exit status 1")),
        FakeConverter::new("rodio", Some(AudioFormat::Wav), Behavior::Write(b"RIFF")),
    ]);

    let result = chain.convert_one(&source, &dir.path().join("a"));
    assert!(matches!(
        result,
        FileResult::Converted {
            substituted: true,
            ..
        }
    ));
    assert_eq!(result.diagnostic_trail(), "ffmpeg: encode failed: exit status 1");
    assert!(!dir.path().join("a.mp3").exists());
}
