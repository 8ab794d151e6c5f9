//! Scenario 1: seed a point table with Brazilian landmarks.

use std::io::Write;

use log::info;
use rusqlite::Connection;
use spatialite_demo_core::{
    BRAZILIAN_LANDMARKS, EngineError, Place, QueryRow, WGS84_SRID, exec, execute, geometry_column,
    query_one,
};

use crate::{MetadataStatus, ScenarioContext, ScenarioError, ensure_spatial_metadata};

/// Table the seeder writes to.
pub const POINTS_TABLE: &str = "points";
/// Geometry column added to [`POINTS_TABLE`].
pub const GEOMETRY_COLUMN: &str = "geom";

/// Outcome of registering the `geom` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryRegistration {
    /// `AddGeometryColumn` created the column.
    Registered,
    /// The column was already in the catalog from an earlier run.
    AlreadyRegistered,
}

/// What a seed run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    /// Whether spatial metadata had to be created.
    pub metadata: MetadataStatus,
    /// Whether the geometry column was new.
    pub geometry: GeometryRegistration,
    /// Rows inserted by this run.
    pub inserted: usize,
}

/// Create the point table if it does not exist.
///
/// # Errors
/// Returns [`ScenarioError::Schema`] when the statement fails.
pub fn create_points_table(connection: &Connection) -> Result<(), ScenarioError> {
    info!("creating table {POINTS_TABLE}");
    exec(
        connection,
        "CREATE TABLE IF NOT EXISTS points (id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL)",
    )
    .map_err(|source| ScenarioError::Schema {
        operation: "CREATE TABLE",
        source,
    })
}

/// Add `points.geom` as a 2D WGS-84 point column.
///
/// SpatiaLite answers `0` when the column already exists, so a `0` is
/// accepted if the catalog already holds a matching registration.
///
/// # Errors
/// Returns [`ScenarioError::Schema`] when the call or the catalog lookup
/// fails, and [`ScenarioError::GeometryColumnRejected`] when the column was
/// neither added nor already registered.
pub fn register_geometry_column(
    connection: &Connection,
) -> Result<GeometryRegistration, ScenarioError> {
    info!("adding geometry column to table {POINTS_TABLE}");
    let row = query_one(
        connection,
        "SELECT AddGeometryColumn(?1, ?2, ?3, 'POINT', 'XY')",
        (POINTS_TABLE, GEOMETRY_COLUMN, WGS84_SRID),
    )
    .map_err(|source| ScenarioError::Schema {
        operation: "AddGeometryColumn",
        source,
    })?;
    if row.as_ref().and_then(QueryRow::first) == Some("1") {
        return Ok(GeometryRegistration::Registered);
    }
    let existing = geometry_column(connection, POINTS_TABLE, GEOMETRY_COLUMN).map_err(
        |source| ScenarioError::Schema {
            operation: "geometry_columns",
            source,
        },
    )?;
    if existing.is_some_and(|column| column.is_xy_point(WGS84_SRID)) {
        info!("{POINTS_TABLE}.{GEOMETRY_COLUMN} already registered");
        Ok(GeometryRegistration::AlreadyRegistered)
    } else {
        Err(ScenarioError::GeometryColumnRejected {
            table: POINTS_TABLE,
            column: GEOMETRY_COLUMN,
        })
    }
}

/// Insert `places` in one deferred transaction, echoing each to `out`.
///
/// Any failure abandons the transaction, which rolls back when it drops.
///
/// # Errors
/// Returns [`ScenarioError::Transaction`] when starting, inserting or
/// committing fails, and [`ScenarioError::Output`] when `out` fails.
pub fn insert_places(
    connection: &mut Connection,
    places: &[Place],
    out: &mut dyn Write,
) -> Result<usize, ScenarioError> {
    info!("adding {} places", places.len());
    let transaction = connection
        .transaction()
        .map_err(|source| ScenarioError::Transaction {
            operation: "BEGIN",
            source: EngineError::exec(source),
        })?;
    let mut inserted = 0;
    for place in places {
        writeln!(out, "Adding {place}")?;
        inserted += execute(
            &transaction,
            "INSERT INTO points (geom) VALUES (GeomFromText(?1, 4326))",
            [place.wkt()],
        )
        .map_err(|source| ScenarioError::Transaction {
            operation: "INSERT",
            source,
        })?;
    }
    info!("committing transaction");
    transaction
        .commit()
        .map_err(|source| ScenarioError::Transaction {
            operation: "COMMIT",
            source: EngineError::exec(source),
        })?;
    Ok(inserted)
}

/// Run the seed scenario: report versions, bootstrap metadata, create the
/// point table, register its geometry column and insert the landmarks.
///
/// # Errors
/// Any step's [`ScenarioError`]; the connection is torn down either way.
pub fn run_seed_scenario(
    context: &ScenarioContext<'_>,
    out: &mut dyn Write,
) -> Result<SeedReport, ScenarioError> {
    let mut session = context.open()?;
    let versions = session
        .versions()
        .map_err(|source| ScenarioError::Open { source })?;
    writeln!(out, "SQLite version: {}", versions.sqlite)?;
    writeln!(
        out,
        "Spatialite version: {}",
        versions.spatialite.as_deref().unwrap_or("unknown")
    )?;

    let connection = session
        .connection_mut()
        .map_err(|source| ScenarioError::Open { source })?;
    let metadata = ensure_spatial_metadata(connection)?;
    create_points_table(connection)?;
    let geometry = register_geometry_column(connection)?;
    let inserted = insert_places(connection, &BRAZILIAN_LANDMARKS, out)?;
    session.close();
    Ok(SeedReport {
        metadata,
        geometry,
        inserted,
    })
}

#[cfg(test)]
mod tests;
