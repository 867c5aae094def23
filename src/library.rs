//! Source file discovery.
//!
//! `discover` turns an input path (single file or directory) into the ordered
//! list of files the batch runner will convert.

mod model;
mod scan;

pub use model::SourceFile;
pub use scan::{DiscoveryError, discover};
