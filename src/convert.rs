//! Conversion backends and the fallback chain that drives them.
//!
//! Three backends exist, tried in this order when available:
//!
//! - `ffmpeg`: spawns the ffmpeg binary and encodes MP3 with LAME
//! - `rodio`: decodes in-process and writes a WAV file with `hound`
//! - `lofty`: reads tags and properties only; always reports that it cannot convert
//!
//! `Capabilities::probe` resolves availability once at startup, and
//! `ConversionChain::convert_one` walks the available backends for one file.
//!
//! # Example
//!
//! ```ignore
//! let caps = Capabilities::probe(&settings.backends)?;
//! let chain = ConversionChain::new(caps.build_converters(&settings), FormatPolicy::default());
//! match chain.convert_one(&source, Path::new("/out/track/track")) {
//!     FileResult::Converted { path, .. } => println!("wrote {}", path.display()),
//!     failed => println!("failed: {}", failed.diagnostic_trail()),
//! }
//! ```

mod chain;
mod error;
mod ffmpeg;
mod probe;
mod tags;
mod traits;
mod types;
mod wav;

pub use chain::ConversionChain;
pub use error::{ConvertError, ProbeError};
pub use probe::Capabilities;
pub use traits::Converter;
pub use types::{
    AudioFormat, Backend, BackendKind, ConversionOutcome, Diagnostic, FileResult, FormatPolicy,
};

#[cfg(test)]
pub(crate) mod tests;
