//! Opening URLs in the user's browser.

use tracing::{debug, warn};

/// Opens `url` in the default browser.
///
/// Returns false when no browser could be launched; the caller should then
/// show the URL so the user can open it by hand.
pub fn open_in_browser(url: &str) -> bool {
    match open::that(url) {
        Ok(()) => {
            debug!(url = %url, "Opened browser");
            true
        }
        Err(e) => {
            warn!(error = %e, "Could not open browser");
            false
        }
    }
}
