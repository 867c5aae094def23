//! The fallback chain: try each backend in order until one yields a valid file.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::library::SourceFile;

use super::traits::Converter;
use super::types::{ConversionOutcome, Diagnostic, FileResult, FormatPolicy};

pub struct ConversionChain {
    converters: Vec<Box<dyn Converter>>,
    policy: FormatPolicy,
}

/// A non-empty regular file at `path`.
fn is_valid_output(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

fn check_source(source: &SourceFile) -> Result<(), Diagnostic> {
    match fs::metadata(&source.path) {
        Err(_) => Err(Diagnostic::precondition("input file does not exist")),
        Ok(m) if !m.is_file() => Err(Diagnostic::precondition("input is not a regular file")),
        Ok(m) if m.len() == 0 => Err(Diagnostic::precondition("input file is empty")),
        Ok(_) => Ok(()),
    }
}

impl ConversionChain {
    pub fn new(converters: Vec<Box<dyn Converter>>, policy: FormatPolicy) -> Self {
        Self { converters, policy }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    /// Run one converter and validate what it left on disk.
    fn attempt(&self, converter: &dyn Converter, source: &Path, base: &Path) -> ConversionOutcome {
        let Some(format) = converter.output_format() else {
            // Metadata-only: let it inspect the file so the diagnostic carries its reading.
            return match converter.convert(source, base) {
                Ok(()) => ConversionOutcome::Failure("backend cannot produce audio".to_string()),
                Err(e) => ConversionOutcome::Failure(e.to_string()),
            };
        };

        if !self.policy.accepts(format) {
            return ConversionOutcome::Failure(format!(
                "produces {format}, but only {} output is accepted",
                self.policy.target
            ));
        }

        let output = format.output_path(base);
        let outcome = match converter.convert(source, &output) {
            Ok(()) if is_valid_output(&output) => ConversionOutcome::Success(output.clone()),
            Ok(()) => ConversionOutcome::Failure("output file is missing or empty".to_string()),
            Err(e) => ConversionOutcome::Failure(e.to_string()),
        };

        if matches!(outcome, ConversionOutcome::Failure(_)) && output.exists() {
            if let Err(e) = fs::remove_file(&output) {
                warn!(path = %output.display(), error = %e, "failed to remove partial output");
            }
        }
        outcome
    }

    /// Convert `source` into `<destination_base>.<ext>` using the first backend that succeeds.
    ///
    /// Never fails outright: every backend error is folded into the returned
    /// `FileResult::Failed` diagnostics, one per backend tried.
    pub fn convert_one(&self, source: &SourceFile, destination_base: &Path) -> FileResult {
        if let Err(diagnostic) = check_source(source) {
            return FileResult::Failed(vec![diagnostic]);
        }

        let mut diagnostics = Vec::new();
        for converter in &self.converters {
            let name = converter.name().to_string();
            debug!(backend = %name, source = %source.path.display(), "trying backend");

            match self.attempt(converter.as_ref(), &source.path, destination_base) {
                ConversionOutcome::Success(path) => {
                    // `attempt` only succeeds for converters that declare a format.
                    let format = converter.output_format().unwrap_or(self.policy.target);
                    return FileResult::Converted {
                        path,
                        format,
                        backend: name,
                        substituted: format != self.policy.target,
                        failed_attempts: diagnostics,
                    };
                }
                ConversionOutcome::Failure(message) => {
                    warn!(backend = %name, source = %source.path.display(), %message, "backend failed");
                    diagnostics.push(Diagnostic::new(name, message));
                }
            }
        }

        FileResult::Failed(diagnostics)
    }
}
