//! Read-only probes over the master catalog and the spatial catalog.

use rusqlite::{Connection, OptionalExtension};

use crate::engine::{EngineError, query_one};

/// Table in which the spatial extension declares reference systems.
pub const SPATIAL_REF_SYS: &str = "spatial_ref_sys";

/// Whether a table called `name` exists.
///
/// # Errors
/// Returns [`EngineError::Prepare`] or [`EngineError::Step`] when the master
/// catalog cannot be queried.
pub fn table_exists(connection: &Connection, name: &str) -> Result<bool, EngineError> {
    let row = query_one(
        connection,
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
    )?;
    Ok(row.is_some())
}

/// Whether the spatial metadata tables have been created.
///
/// Bootstrapping metadata twice is a no-op or an error depending on the
/// SpatiaLite version, so callers probe first.
///
/// # Errors
/// See [`table_exists`].
pub fn spatial_metadata_exists(connection: &Connection) -> Result<bool, EngineError> {
    table_exists(connection, SPATIAL_REF_SYS)
}

/// A geometry column as registered in `geometry_columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryColumn {
    /// Spatial reference system id.
    pub srid: i64,
    /// SpatiaLite geometry type code (1 = POINT, 6 = MULTIPOLYGON, ...).
    pub geometry_type: i64,
    /// Coordinate dimension code (2 = XY, 3 = XYZ, ...).
    pub coord_dimension: i64,
}

impl GeometryColumn {
    /// Geometry type code for `POINT`.
    pub const POINT: i64 = 1;
    /// Coordinate dimension code for `XY`.
    pub const XY: i64 = 2;

    /// Whether this is a 2D point column in the given SRID.
    #[must_use]
    pub const fn is_xy_point(&self, srid: i64) -> bool {
        self.srid == srid && self.geometry_type == Self::POINT && self.coord_dimension == Self::XY
    }
}

/// Look up the catalog registration for `table.column`.
///
/// SpatiaLite stores names in lower case, so the match ignores case.
///
/// # Errors
/// Returns [`EngineError::Prepare`] or [`EngineError::Step`] when the catalog
/// cannot be read; a missing catalog surfaces as a prepare error.
pub fn geometry_column(
    connection: &Connection,
    table: &str,
    column: &str,
) -> Result<Option<GeometryColumn>, EngineError> {
    let mut statement = connection
        .prepare(
            "SELECT srid, geometry_type, coord_dimension FROM geometry_columns
             WHERE lower(f_table_name) = lower(?1) AND lower(f_geometry_column) = lower(?2)",
        )
        .map_err(|source| EngineError::Prepare { source })?;
    statement
        .query_row((table, column), |row| {
            Ok(GeometryColumn {
                srid: row.get(0)?,
                geometry_type: row.get(1)?,
                coord_dimension: row.get(2)?,
            })
        })
        .optional()
        .map_err(|source| EngineError::Step { source })
}
