//! Scenario 2: import Brazilian state boundaries and locate places in them.

use std::io::Write;

use camino::Utf8Path;
use log::{info, warn};
use rusqlite::Connection;
use spatialite_demo_core::{LOOKUP_PLACES, Place, QueryRow, query_one, table_exists};
use spatialite_demo_fs::missing_shapefile_components;

use crate::{MetadataStatus, ScenarioContext, ScenarioError, ensure_spatial_metadata};

/// Base path of the state boundary shapefile, without extension.
pub const DEFAULT_SHAPEFILE: &str = "../shp/BR_UF_2022";
/// Table the shapefile is imported into.
pub const LOCATION_TABLE: &str = "location";
/// Character set of the shapefile's attribute table.
pub const SHAPEFILE_CHARSET: &str = "UTF-8";

/// Whether the shapefile was loaded by this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// `ImportSHP` loaded this many rows.
    Imported(u64),
    /// [`LOCATION_TABLE`] already existed, so nothing was imported.
    Skipped,
}

/// The state a place fell in, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// Place that was looked up.
    pub place: Place,
    /// `NM_UF` of the containing state.
    pub state: Option<String>,
}

/// What a lookup run did.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupReport {
    /// Whether spatial metadata had to be created.
    pub metadata: MetadataStatus,
    /// Whether the shapefile was imported.
    pub import: ImportOutcome,
    /// One entry per place, in lookup order.
    pub lookups: Vec<Lookup>,
}

/// Import the shapefile at `shapefile` (no extension) into
/// [`LOCATION_TABLE`].
///
/// Nothing is imported when the table already exists.
///
/// # Errors
/// Returns [`ScenarioError::Probe`] when the catalog cannot be read,
/// [`ScenarioError::MissingShapefile`] or
/// [`ScenarioError::InspectShapefile`] when the sidecar files are absent or
/// unreadable, [`ScenarioError::Import`] when `ImportSHP` fails and
/// [`ScenarioError::ImportRejected`] when it loads nothing.
pub fn import_shapefile(
    connection: &Connection,
    shapefile: &Utf8Path,
) -> Result<ImportOutcome, ScenarioError> {
    if table_exists(connection, LOCATION_TABLE).map_err(|source| ScenarioError::Probe { source })?
    {
        warn!("table {LOCATION_TABLE} already exists; skipping import of {shapefile}");
        return Ok(ImportOutcome::Skipped);
    }
    let missing = missing_shapefile_components(shapefile).map_err(|source| {
        ScenarioError::InspectShapefile {
            path: shapefile.to_owned(),
            source,
        }
    })?;
    if !missing.is_empty() {
        return Err(ScenarioError::MissingShapefile {
            path: shapefile.to_owned(),
            missing,
        });
    }

    info!("importing shapefile {shapefile}");
    let row = query_one(
        connection,
        "SELECT ImportSHP(?1, ?2, ?3)",
        (shapefile.as_str(), LOCATION_TABLE, SHAPEFILE_CHARSET),
    )
    .map_err(|source| ScenarioError::Import {
        path: shapefile.to_owned(),
        source,
    })?;
    match row
        .as_ref()
        .and_then(QueryRow::first)
        .and_then(|count| count.parse::<u64>().ok())
    {
        Some(count) if count > 0 => {
            info!("imported {count} rows into {LOCATION_TABLE}");
            Ok(ImportOutcome::Imported(count))
        }
        _ => Err(ScenarioError::ImportRejected {
            path: shapefile.to_owned(),
        }),
    }
}

/// Name of the state containing `place`, if any.
///
/// # Errors
/// Returns [`ScenarioError::Query`] when the lookup cannot be prepared or
/// stepped.
pub fn locate_place(connection: &Connection, place: &Place) -> Result<Option<String>, ScenarioError> {
    let row = query_one(
        connection,
        "SELECT NM_UF FROM location WHERE ST_Within(GeomFromText(?1, 4326), geometry) = 1",
        [place.wkt()],
    )
    .map_err(|source| ScenarioError::Query {
        label: place.label(),
        source,
    })?;
    Ok(row.and_then(|found| found.first().map(str::to_owned)))
}

/// Run the lookup scenario against the shapefile at `shapefile`.
///
/// The extension's security mode is relaxed before the database opens so
/// `ImportSHP` is available. Each place is written to `out` as
/// `<label> ---> <state>`, or `Not found`.
///
/// # Errors
/// Any step's [`ScenarioError`]; the connection is torn down either way.
pub fn run_lookup_scenario(
    context: &ScenarioContext<'_>,
    shapefile: &Utf8Path,
    out: &mut dyn Write,
) -> Result<LookupReport, ScenarioError> {
    context.extension().relax_security();
    let mut session = context.open()?;
    let connection = session
        .connection()
        .map_err(|source| ScenarioError::Open { source })?;
    let metadata = ensure_spatial_metadata(connection)?;
    let import = import_shapefile(connection, shapefile)?;

    let mut lookups = Vec::with_capacity(LOOKUP_PLACES.len());
    for place in LOOKUP_PLACES {
        let state = locate_place(connection, &place)?;
        writeln!(
            out,
            "{} ---> {}",
            place.label(),
            state.as_deref().unwrap_or("Not found")
        )?;
        lookups.push(Lookup { place, state });
    }
    session.close();
    Ok(LookupReport {
        metadata,
        import,
        lookups,
    })
}

#[cfg(test)]
mod tests;
