//! Engine configuration shared by the scenarios and the CLI.

use std::time::Duration;

/// Library name handed to SQLite's extension loader when none is configured.
///
/// SQLite resolves the platform suffix and derives the entry point
/// (`sqlite3_modspatialite_init`) from this name.
pub const DEFAULT_EXTENSION_LIBRARY: &str = "mod_spatialite";

/// Settings applied to every connection the adapter opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// How long SQLite retries a locked database before giving up.
    ///
    /// `None` leaves SQLite's default (fail immediately) in place.
    pub busy_timeout: Option<Duration>,
}

impl OpenOptions {
    /// Options with a busy timeout.
    #[must_use]
    pub const fn with_busy_timeout(timeout: Duration) -> Self {
        Self {
            busy_timeout: Some(timeout),
        }
    }
}

/// Resolved configuration for the production spatial extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Path or bare name of the `mod_spatialite` shared library.
    pub extension_library: String,
    /// Explicit extension entry point; `None` lets SQLite derive it.
    pub entry_point: Option<String>,
    /// Connection-level settings.
    pub open: OpenOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extension_library: DEFAULT_EXTENSION_LIBRARY.to_owned(),
            entry_point: None,
            open: OpenOptions::default(),
        }
    }
}
