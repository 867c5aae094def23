use tracing::{info, warn};

use crate::app::App;
use crate::convert::Capabilities;

/// Log what the probe found and surface reduced-capability warnings.
pub fn announce_capabilities(caps: &Capabilities) -> Vec<String> {
    let names: Vec<&str> = caps.available().map(|b| b.kind.name()).collect();
    info!(backends = ?names, best_format = ?caps.best_format(), "conversion backends ready");

    let warnings = caps.warnings();
    for w in &warnings {
        warn!("{w}");
    }
    warnings
}

/// Seed the app with probe results. Returns whether the batch should start
/// without waiting for the user.
pub fn apply_startup(app: &mut App, caps: &Capabilities, assume_yes: bool) -> bool {
    app.set_capabilities(caps);
    assume_yes && app.can_start()
}
