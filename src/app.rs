//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the discovered files, their
//! per-file status and the run state.

mod model;

pub use model::*;
