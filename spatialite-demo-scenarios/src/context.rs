//! What a scenario needs to open its database.

use log::info;
use rusqlite::Connection;
use spatialite_demo_core::{
    DatabaseLocation, OpenOptions, QueryRow, SpatialConnection, SpatialExtension, query_one,
    spatial_metadata_exists,
};

use crate::ScenarioError;

/// Database, connection options and spatial extension for one scenario run.
#[derive(Clone, Copy)]
pub struct ScenarioContext<'a> {
    location: &'a DatabaseLocation,
    options: OpenOptions,
    extension: &'a dyn SpatialExtension,
}

impl std::fmt::Debug for ScenarioContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("location", self.location)
            .field("options", &self.options)
            .field("extension", &self.extension.name())
            .finish()
    }
}

impl<'a> ScenarioContext<'a> {
    /// Context with default connection options.
    #[must_use]
    pub fn new(location: &'a DatabaseLocation, extension: &'a dyn SpatialExtension) -> Self {
        Self {
            location,
            options: OpenOptions::default(),
            extension,
        }
    }

    /// Replace the connection options.
    #[must_use]
    pub const fn with_options(mut self, options: OpenOptions) -> Self {
        self.options = options;
        self
    }

    /// Database the scenario runs against.
    #[must_use]
    pub const fn location(&self) -> &'a DatabaseLocation {
        self.location
    }

    /// Extension attached to every connection.
    #[must_use]
    pub const fn extension(&self) -> &'a dyn SpatialExtension {
        self.extension
    }

    /// Open the database and attach the extension.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Open`] when the database cannot be opened or
    /// the extension cannot be attached.
    pub fn open(&self) -> Result<SpatialConnection<'a>, ScenarioError> {
        info!("opening database {}", self.location);
        SpatialConnection::open(self.location, self.extension, &self.options)
            .map_err(|source| ScenarioError::Open { source })
    }
}

/// Whether a scenario found spatial metadata or had to create it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataStatus {
    /// `spatial_ref_sys` already existed.
    AlreadyPresent,
    /// `InitSpatialMetaData(1)` created the catalog.
    Initialised,
}

/// Create the spatial catalog unless it is already there.
///
/// # Errors
/// Returns [`ScenarioError::Probe`] when the master catalog cannot be read,
/// [`ScenarioError::Bootstrap`] when `InitSpatialMetaData` fails, and
/// [`ScenarioError::BootstrapRejected`] when it returns anything but `1`.
pub fn ensure_spatial_metadata(connection: &Connection) -> Result<MetadataStatus, ScenarioError> {
    if spatial_metadata_exists(connection).map_err(|source| ScenarioError::Probe { source })? {
        info!("spatial metadata already present");
        return Ok(MetadataStatus::AlreadyPresent);
    }
    info!("initialising spatial metadata");
    let row = query_one(connection, "SELECT InitSpatialMetaData(1)", [])
        .map_err(|source| ScenarioError::Bootstrap { source })?;
    match row.as_ref().and_then(QueryRow::first) {
        Some("1") => Ok(MetadataStatus::Initialised),
        other => Err(ScenarioError::BootstrapRejected {
            result: other.unwrap_or("NULL").to_owned(),
        }),
    }
}
