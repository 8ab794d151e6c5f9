//! Connection lifecycle for a SQLite database with a spatial extension.
//!
//! [`SpatialConnection`] owns the `rusqlite` connection and the context the
//! extension allocated for it. Teardown happens in one place, whether the
//! caller closes explicitly or the value is dropped on an error path.

mod error;
mod extension;
mod sql;

use std::fmt;

use camino::Utf8PathBuf;
use log::{debug, info, warn};
use rusqlite::{Connection, OpenFlags, Params};

use crate::config::OpenOptions;

pub use error::EngineError;
pub use extension::{ExtensionContext, ModSpatialite, SECURITY_ENV, SpatialExtension};
pub use sql::{QueryRow, exec, execute, query_one};

/// Name SQLite reserves for a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A private, non-persistent database.
    InMemory,
    /// A database file, created when absent.
    File(Utf8PathBuf),
}

impl DatabaseLocation {
    /// Location for an optional database name; no name, or the literal
    /// `:memory:`, selects the in-memory store.
    #[must_use]
    pub fn from_name(name: Option<Utf8PathBuf>) -> Self {
        match name {
            Some(path) if path.as_str() != IN_MEMORY => Self::File(path),
            _ => Self::InMemory,
        }
    }

    /// Whether this is the in-memory store.
    #[must_use]
    pub const fn is_in_memory(&self) -> bool {
        matches!(self, Self::InMemory)
    }
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory => f.write_str(IN_MEMORY),
            Self::File(path) => write!(f, "{path}"),
        }
    }
}

/// Library versions reported by an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVersions {
    /// Version of the linked SQLite library.
    pub sqlite: String,
    /// Version reported by `spatialite_version()`, if the extension answered.
    pub spatialite: Option<String>,
}

/// An open database with a spatial extension attached.
///
/// Teardown order is fixed: the connection closes first, then the extension
/// context is released, then the extension's shutdown hook runs. The hook
/// runs exactly once per session.
pub struct SpatialConnection<'ext> {
    location: DatabaseLocation,
    connection: Option<Connection>,
    context: Option<ExtensionContext>,
    extension: &'ext dyn SpatialExtension,
    shut_down: bool,
}

impl fmt::Debug for SpatialConnection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialConnection")
            .field("location", &self.location)
            .field("open", &self.connection.is_some())
            .field("extension", &self.extension.name())
            .finish_non_exhaustive()
    }
}

impl<'ext> SpatialConnection<'ext> {
    /// Open `location` read-write, creating it when absent, and attach
    /// `extension`.
    ///
    /// Whatever fails after the database opens, the partially built session
    /// is torn down before the error is returned. When SQLite refuses to open
    /// the database, the extension's shutdown hook still runs once.
    ///
    /// # Errors
    /// Returns [`EngineError::Open`] when SQLite refuses the database,
    /// [`EngineError::Configure`] when a connection setting fails, and
    /// whatever the extension reports from `attach`.
    pub fn open(
        location: &DatabaseLocation,
        extension: &'ext dyn SpatialExtension,
        options: &OpenOptions,
    ) -> Result<Self, EngineError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let opened = match location {
            DatabaseLocation::InMemory => Connection::open_in_memory_with_flags(flags),
            DatabaseLocation::File(path) => Connection::open_with_flags(path, flags),
        };
        let connection = opened.map_err(|source| {
            extension.shutdown();
            EngineError::Open {
                location: location.clone(),
                source,
            }
        })?;
        info!("opened database {location}");

        let mut session = Self {
            location: location.clone(),
            connection: Some(connection),
            context: None,
            extension,
            shut_down: false,
        };
        session.configure(options)?;
        let context = extension.attach(session.connection()?)?;
        debug!(
            "attached {} context #{} to {location}",
            context.extension(),
            context.serial()
        );
        session.context = Some(context);
        Ok(session)
    }

    fn configure(&self, options: &OpenOptions) -> Result<(), EngineError> {
        if let Some(timeout) = options.busy_timeout {
            self.connection()?
                .busy_timeout(timeout)
                .map_err(|source| EngineError::Configure {
                    setting: "busy_timeout",
                    source,
                })?;
        }
        Ok(())
    }

    /// Database this session points at.
    #[must_use]
    pub const fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// Whether [`Self::close`] has already run.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    /// Borrow the underlying connection.
    ///
    /// # Errors
    /// Returns [`EngineError::Closed`] after the session has been closed.
    pub fn connection(&self) -> Result<&Connection, EngineError> {
        self.connection.as_ref().ok_or_else(|| EngineError::Closed {
            location: self.location.clone(),
        })
    }

    /// Mutably borrow the underlying connection, e.g. to start a transaction.
    ///
    /// # Errors
    /// Returns [`EngineError::Closed`] after the session has been closed.
    pub fn connection_mut(&mut self) -> Result<&mut Connection, EngineError> {
        let location = &self.location;
        self.connection.as_mut().ok_or_else(|| EngineError::Closed {
            location: location.clone(),
        })
    }

    /// Execute statements that produce no rows. See [`exec`].
    ///
    /// # Errors
    /// Returns [`EngineError::Exec`] or [`EngineError::Closed`].
    pub fn exec(&self, sql: &str) -> Result<(), EngineError> {
        exec(self.connection()?, sql)
    }

    /// Execute one parameterised statement. See [`execute`].
    ///
    /// # Errors
    /// Returns [`EngineError::Exec`] or [`EngineError::Closed`].
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize, EngineError> {
        execute(self.connection()?, sql, params)
    }

    /// Step a query once and materialise its first row. See [`query_one`].
    ///
    /// # Errors
    /// Returns [`EngineError::Prepare`], [`EngineError::Step`] or
    /// [`EngineError::Closed`].
    pub fn query_one<P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Option<QueryRow>, EngineError> {
        query_one(self.connection()?, sql, params)
    }

    /// SQLite and spatial extension versions.
    ///
    /// # Errors
    /// Returns an error when `spatialite_version()` cannot be queried.
    pub fn versions(&self) -> Result<EngineVersions, EngineError> {
        let spatialite = self
            .query_one("SELECT spatialite_version()", [])?
            .and_then(|row| row.first().map(str::to_owned));
        Ok(EngineVersions {
            sqlite: rusqlite::version().to_owned(),
            spatialite,
        })
    }

    /// Close the connection, release the extension context and shut the
    /// extension down. Calling it again does nothing.
    ///
    /// A failure to close is logged; the remaining teardown still runs.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            match connection.close() {
                Ok(()) => debug!("closed database {}", self.location),
                Err((connection, error)) => {
                    warn!("error closing database {}: {error}", self.location);
                    drop(connection);
                }
            }
        }
        if let Some(context) = self.context.take() {
            self.extension.release(context);
        }
        if !self.shut_down {
            self.shut_down = true;
            self.extension.shutdown();
        }
    }
}

impl Drop for SpatialConnection<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
