//! The seam between the adapter and the spatial extension it attaches.

use log::debug;
use rusqlite::{Connection, LoadExtensionGuard};

use crate::config::EngineConfig;

use super::error::{EngineError, engine_message};

/// Environment variable SpatiaLite consults when it registers functions that
/// touch the filesystem (`ImportSHP` among them).
pub const SECURITY_ENV: &str = "SPATIALITE_SECURITY";

/// A spatial extension that can be attached to SQLite connections.
///
/// The adapter drives the lifecycle: `attach` once per connection, `release`
/// after that connection has closed, then `shutdown` once per session.
pub trait SpatialExtension {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Allow the extension's filesystem-touching functions.
    ///
    /// Must be called before the connection is opened; the extension reads
    /// its security mode when it is attached.
    fn relax_security(&self);

    /// Register the extension with a freshly opened connection.
    ///
    /// # Errors
    /// Returns [`EngineError::AttachExtension`] when the extension cannot be
    /// registered.
    fn attach(&self, connection: &Connection) -> Result<ExtensionContext, EngineError>;

    /// Release a context whose connection has already been closed.
    fn release(&self, context: ExtensionContext);

    /// Process-wide teardown, invoked exactly once per opened session.
    fn shutdown(&self);
}

/// Per-connection state handed out by [`SpatialExtension::attach`].
#[derive(Debug, PartialEq, Eq)]
pub struct ExtensionContext {
    extension: String,
    serial: u64,
}

impl ExtensionContext {
    /// Context for the named extension. `serial` distinguishes contexts
    /// allocated by the same extension.
    #[must_use]
    pub fn new(extension: impl Into<String>, serial: u64) -> Self {
        Self {
            extension: extension.into(),
            serial,
        }
    }

    /// Name of the extension that allocated the context.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Allocation serial.
    #[must_use]
    pub const fn serial(&self) -> u64 {
        self.serial
    }
}

/// The native `mod_spatialite` library, loaded through SQLite's extension
/// loader.
///
/// SpatiaLite keeps its per-connection cache inside the connection when it is
/// loaded this way, so closing the connection frees it; `release` and
/// `shutdown` only record the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModSpatialite {
    library: String,
    entry_point: Option<String>,
}

impl ModSpatialite {
    /// Extension backed by the given library path or name.
    #[must_use]
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            entry_point: None,
        }
    }

    /// Extension described by an [`EngineConfig`].
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            library: config.extension_library.clone(),
            entry_point: config.entry_point.clone(),
        }
    }

    /// Override the entry point SQLite would otherwise derive.
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    /// Library path or name handed to the loader.
    #[must_use]
    pub fn library(&self) -> &str {
        &self.library
    }
}

impl SpatialExtension for ModSpatialite {
    fn name(&self) -> &str {
        &self.library
    }

    #[expect(
        unsafe_code,
        reason = "mutating the process environment is unsafe in edition 2024"
    )]
    fn relax_security(&self) {
        debug!("setting {SECURITY_ENV}=relaxed");
        // SAFETY: the demo runs on a single thread and sets the variable
        // before SQLite or SpatiaLite read the environment.
        unsafe { std::env::set_var(SECURITY_ENV, "relaxed") };
    }

    fn attach(&self, connection: &Connection) -> Result<ExtensionContext, EngineError> {
        load_library(connection, &self.library, self.entry_point.as_deref()).map_err(|source| {
            EngineError::AttachExtension {
                extension: self.library.clone(),
                message: engine_message(&source),
            }
        })?;
        debug!("loaded spatial extension {}", self.library);
        Ok(ExtensionContext::new(self.library.as_str(), 0))
    }

    /// Loader-attached `mod_spatialite` keeps its per-connection state in the
    /// connection itself, so closing the connection frees it and release
    /// only records the event.
    fn release(&self, context: ExtensionContext) {
        debug!(
            "released {} context #{}",
            context.extension(),
            context.serial()
        );
    }

    /// A no-op for loader-attached `mod_spatialite`: its global state lives
    /// until the process exits and there is no shutdown hook to call.
    fn shutdown(&self) {
        debug!("spatial extension {} shut down", self.library);
    }
}

#[expect(
    unsafe_code,
    reason = "SQLite's extension loader runs native library code"
)]
fn load_library(
    connection: &Connection,
    library: &str,
    entry_point: Option<&str>,
) -> rusqlite::Result<()> {
    // SAFETY: the library path comes from operator configuration, and the
    // guard disables extension loading again as soon as it drops.
    unsafe {
        let _guard = LoadExtensionGuard::new(connection)?;
        connection.load_extension(library, entry_point)
    }
}
