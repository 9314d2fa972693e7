use std::path::Path;

use crate::config;
use crate::error::Error;

/// Load settings from `path` (or the default location), falling back to
/// defaults when the file is unreadable or invalid.
///
/// Logging is not set up yet when this runs, so the failure is handed back
/// for the caller to report.
pub fn load_settings(path: Option<&Path>) -> (config::Settings, Option<Error>) {
    let loaded = match path {
        Some(p) => config::Settings::load_from(Some(p)),
        None => config::Settings::load(),
    };

    match loaded {
        Ok(s) => match s.validate() {
            Ok(()) => (s, None),
            Err(e) => (config::Settings::default(), Some(e)),
        },
        // Config is optional; failures should not prevent the player from starting.
        Err(e) => (config::Settings::default(), Some(e)),
    }
}
