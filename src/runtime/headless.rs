use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::batch::{BatchError, BatchReport, Progress, Stage, run_batch};
use crate::convert::ConversionChain;
use crate::library::SourceFile;

fn progress_line(p: &Progress) -> String {
    match p.stage {
        Stage::Started => format!("[{}/{}] {}", p.index + 1, p.total, p.status),
        Stage::Finished => format!("[{}/{}] {}: {}", p.index + 1, p.total, p.file_name, p.status),
    }
}

/// Run the batch on the calling thread, printing one line per event to `out`.
pub fn run_with_output<W: Write>(
    files: &[SourceFile],
    chain: &ConversionChain,
    destination: &Path,
    cancel: &AtomicBool,
    out: &mut W,
) -> Result<BatchReport, BatchError> {
    let report = run_batch(files, chain, destination, cancel, |p| {
        // A closed stdout must not stop the batch.
        let _ = writeln!(out, "{}", progress_line(p));
    })?;

    for line in report.summary_lines() {
        let _ = writeln!(out, "{line}");
    }
    Ok(report)
}

/// Headless mode: stdout for progress, Ctrl+C requests a stop between files.
pub fn run(
    files: &[SourceFile],
    chain: &ConversionChain,
    destination: &Path,
) -> Result<BatchReport, BatchError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!(error = %e, "could not install Ctrl+C handler");
    }

    let mut out = io::stdout().lock();
    run_with_output(files, chain, destination, &cancel, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::AudioFormat;
    use crate::convert::tests::{Behavior, FakeConverter, chain_of};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn prints_progress_and_summary() {
        let src = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        let good = src.path().join("a.ogg");
        let empty = src.path().join("c.ogg");
        fs::write(&good, b"ogg bytes").unwrap();
        fs::write(&empty, b"").unwrap();
        let files = vec![SourceFile::new(&good, 9), SourceFile::new(&empty, 0)];

        let chain = chain_of(vec![FakeConverter::new(
            "fake-mp3",
            Some(AudioFormat::Mp3),
            Behavior::Write(b"ID3"),
        )]);
        let cancel = AtomicBool::new(false);
        let mut buf = Vec::new();
        let report = run_with_output(&files, &chain, out_dir.path(), &cancel, &mut buf).unwrap();
        assert_eq!(report.succeeded(), 1);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[1/2] converting a.ogg",
                "[1/2] a.ogg: converted to mp3",
                "[2/2] converting c.ogg",
                "[2/2] c.ogg: failed",
                "converted 1 of 2 file(s), 1 failed",
                "",
                "failed files:",
                "c.ogg: precondition: input file is empty",
            ]
        );
    }
}
