//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive discovery,
//! conversion and logging, plus helpers to load configuration from disk.

mod load;
mod schema;

pub use load::default_log_path;
pub use schema::*;
