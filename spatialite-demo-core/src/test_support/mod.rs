//! Test-only, in-process stand-in for SpatiaLite.
//!
//! [`StubSpatialite`] registers the handful of SQL functions the scenarios
//! call, implemented over plain SQLite tables and the `geo` crate. Geometries
//! are stored as `SRID=<srid>;<wkt>` text rather than SpatiaLite blobs.
//!
//! `ImportSHP` is only registered when security was relaxed before attach,
//! and reads `<path>.tsv` (one `NM_UF<TAB>WKT` row per line) instead of a
//! real shapefile.

use std::{
    fs,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use geo::{Geometry, Intersects};
use wkt::TryFromWkt;
use rusqlite::{
    Connection, OptionalExtension,
    functions::{Context, FunctionFlags},
};

use crate::engine::{EngineError, ExtensionContext, SpatialExtension};

/// Name the stub reports for itself and from `spatialite_version()`.
pub const STUB_NAME: &str = "stub-spatialite";

/// Lifecycle steps recorded by [`StubSpatialite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Functions were registered on a connection.
    Attached(u64),
    /// SQLite destroyed the connection's functions, i.e. it closed.
    ConnectionClosed(u64),
    /// The adapter released the context.
    ContextReleased(u64),
    /// The adapter invoked the shutdown hook.
    Shutdown,
}

type Journal = Arc<Mutex<Vec<LifecycleEvent>>>;

fn record(journal: &Journal, event: LifecycleEvent) {
    journal
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(event);
}

/// In-process spatial extension for tests.
#[derive(Debug, Default)]
pub struct StubSpatialite {
    relaxed: AtomicBool,
    next_serial: AtomicU64,
    attach_failure: Option<String>,
    journal: Journal,
}

impl StubSpatialite {
    /// A stub that attaches successfully.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A stub whose `attach` always fails with `message`.
    #[must_use]
    pub fn failing_attach(message: impl Into<String>) -> Self {
        Self {
            attach_failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Every lifecycle event so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times the shutdown hook ran.
    #[must_use]
    pub fn shutdown_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, LifecycleEvent::Shutdown))
            .count()
    }

    /// Whether [`SpatialExtension::relax_security`] was called.
    #[must_use]
    pub fn is_relaxed(&self) -> bool {
        self.relaxed.load(Ordering::SeqCst)
    }
}

impl SpatialExtension for StubSpatialite {
    fn name(&self) -> &str {
        STUB_NAME
    }

    fn relax_security(&self) {
        self.relaxed.store(true, Ordering::SeqCst);
    }

    fn attach(&self, connection: &Connection) -> Result<ExtensionContext, EngineError> {
        if let Some(message) = &self.attach_failure {
            return Err(EngineError::AttachExtension {
                extension: STUB_NAME.to_owned(),
                message: message.clone(),
            });
        }
        let serial = self.next_serial.fetch_add(1, Ordering::SeqCst);
        register_functions(connection, self.is_relaxed()).map_err(|source| {
            EngineError::AttachExtension {
                extension: STUB_NAME.to_owned(),
                message: source.to_string(),
            }
        })?;
        register_close_sentinel(connection, CloseSentinel {
            serial,
            journal: Arc::clone(&self.journal),
        })
        .map_err(|source| EngineError::AttachExtension {
            extension: STUB_NAME.to_owned(),
            message: source.to_string(),
        })?;
        record(&self.journal, LifecycleEvent::Attached(serial));
        Ok(ExtensionContext::new(STUB_NAME, serial))
    }

    fn release(&self, context: ExtensionContext) {
        record(
            &self.journal,
            LifecycleEvent::ContextReleased(context.serial()),
        );
    }

    fn shutdown(&self) {
        record(&self.journal, LifecycleEvent::Shutdown);
    }
}

/// Owned by a registered function; SQLite drops it when the connection
/// closes.
struct CloseSentinel {
    serial: u64,
    journal: Journal,
}

impl CloseSentinel {
    fn value(&self) -> i64 {
        i64::try_from(self.serial).unwrap_or(i64::MAX)
    }
}

impl Drop for CloseSentinel {
    fn drop(&mut self) {
        record(&self.journal, LifecycleEvent::ConnectionClosed(self.serial));
    }
}

fn register_close_sentinel(connection: &Connection, sentinel: CloseSentinel) -> rusqlite::Result<()> {
    connection.create_scalar_function(
        "stub_connection_serial",
        0,
        FunctionFlags::SQLITE_UTF8,
        move |_ctx| Ok(sentinel.value()),
    )
}

fn register_functions(connection: &Connection, relaxed: bool) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8;
    connection.create_scalar_function("spatialite_version", 0, flags, |_ctx| {
        Ok(STUB_NAME.to_owned())
    })?;
    connection.create_scalar_function("InitSpatialMetaData", 0, flags, init_spatial_metadata)?;
    connection.create_scalar_function("InitSpatialMetaData", 1, flags, init_spatial_metadata)?;
    connection.create_scalar_function("AddGeometryColumn", 5, flags, add_geometry_column)?;
    connection.create_scalar_function("GeomFromText", 1, flags, geom_from_text)?;
    connection.create_scalar_function("GeomFromText", 2, flags, geom_from_text)?;
    connection.create_scalar_function("AsText", 1, flags, as_text)?;
    connection.create_scalar_function("ST_Within", 2, flags, st_within)?;
    if relaxed {
        connection.create_scalar_function("ImportSHP", 3, flags, import_shp)?;
    }
    Ok(())
}

fn user_error(message: impl Into<String>) -> rusqlite::Error {
    rusqlite::Error::UserFunctionError(message.into().into())
}

fn table_exists(connection: &Connection, name: &str) -> rusqlite::Result<bool> {
    connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Run `body` against the connection that invoked the function.
#[expect(
    unsafe_code,
    reason = "re-entering the calling connection mirrors how SpatiaLite's own functions run DDL"
)]
fn with_connection<T>(
    ctx: &Context<'_>,
    body: impl FnOnce(&Connection) -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
    // SAFETY: the reference is only used for the duration of the function
    // call, while SQLite keeps the connection alive.
    let connection = unsafe { ctx.get_connection()? };
    body(&connection)
}

fn init_spatial_metadata(ctx: &Context<'_>) -> rusqlite::Result<i64> {
    with_connection(ctx, |connection| {
        if table_exists(connection, "spatial_ref_sys")? {
            return Ok(0);
        }
        connection.execute_batch(
            "CREATE TABLE spatial_ref_sys (
                srid INTEGER NOT NULL PRIMARY KEY,
                auth_name TEXT NOT NULL,
                auth_srid INTEGER NOT NULL,
                ref_sys_name TEXT NOT NULL DEFAULT 'Unknown',
                proj4text TEXT NOT NULL,
                srtext TEXT NOT NULL DEFAULT 'Undefined'
            );
            INSERT INTO spatial_ref_sys VALUES
                (4326, 'epsg', 4326, 'WGS 84', '+proj=longlat +datum=WGS84 +no_defs', 'Undefined'),
                (4674, 'epsg', 4674, 'SIRGAS 2000', '+proj=longlat +ellps=GRS80 +no_defs', 'Undefined');
            CREATE TABLE geometry_columns (
                f_table_name TEXT NOT NULL,
                f_geometry_column TEXT NOT NULL,
                geometry_type INTEGER NOT NULL,
                coord_dimension INTEGER NOT NULL,
                srid INTEGER NOT NULL,
                spatial_index_enabled INTEGER NOT NULL,
                PRIMARY KEY (f_table_name, f_geometry_column)
            );",
        )?;
        Ok(1)
    })
}

fn geometry_type_code(name: &str) -> Option<i64> {
    match name.to_ascii_uppercase().as_str() {
        "POINT" => Some(1),
        "LINESTRING" => Some(2),
        "POLYGON" => Some(3),
        "MULTIPOINT" => Some(4),
        "MULTILINESTRING" => Some(5),
        "MULTIPOLYGON" => Some(6),
        "GEOMETRYCOLLECTION" => Some(7),
        _ => None,
    }
}

fn dimension_code(name: &str) -> Option<i64> {
    match name.to_ascii_uppercase().as_str() {
        "XY" | "2" => Some(2),
        "XYZ" | "XYM" | "3" => Some(3),
        "XYZM" | "4" => Some(4),
        _ => None,
    }
}

fn register_geometry_column(
    connection: &Connection,
    table: &str,
    column: &str,
    codes: (i64, i64),
    srid: i64,
) -> rusqlite::Result<()> {
    connection.execute(
        "INSERT INTO geometry_columns VALUES (lower(?1), lower(?2), ?3, ?4, ?5, 0)",
        (table, column, codes.0, codes.1, srid),
    )?;
    Ok(())
}

/// Mirrors SpatiaLite: problems are reported as a `0` result, not an error.
fn add_geometry_column(ctx: &Context<'_>) -> rusqlite::Result<i64> {
    let table: String = ctx.get(0)?;
    let column: String = ctx.get(1)?;
    let srid: i64 = ctx.get(2)?;
    let geometry_type: String = ctx.get(3)?;
    let dimension: String = ctx.get(4)?;
    let (Some(type_code), Some(dimension_code)) =
        (geometry_type_code(&geometry_type), dimension_code(&dimension))
    else {
        return Ok(0);
    };
    with_connection(ctx, |connection| {
        if !table_exists(connection, "spatial_ref_sys")? || !table_exists(connection, &table)? {
            return Ok(0);
        }
        let registered = connection
            .query_row(
                "SELECT 1 FROM geometry_columns
                 WHERE f_table_name = lower(?1) AND f_geometry_column = lower(?2)",
                (&table, &column),
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if registered {
            return Ok(0);
        }
        connection.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quote_identifier(&table),
            quote_identifier(&column),
            geometry_type.to_ascii_uppercase()
        ))?;
        register_geometry_column(connection, &table, &column, (type_code, dimension_code), srid)?;
        Ok(1)
    })
}

/// Parse Well-Known Text into a `geo` geometry; `None` when unreadable.
#[must_use]
pub fn parse_geometry(text: &str) -> Option<Geometry<f64>> {
    Geometry::<f64>::try_from_wkt_str(text.trim()).ok()
}

fn encode(srid: i64, text: &str) -> String {
    format!("SRID={srid};{}", text.trim())
}

fn decode(stored: &str) -> Option<(i64, &str)> {
    let (prefix, text) = stored.split_once(';')?;
    let srid = prefix.strip_prefix("SRID=")?.parse().ok()?;
    Some((srid, text))
}

/// Invalid text yields `NULL`, as SpatiaLite does.
fn geom_from_text(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    let Some(text) = ctx.get::<Option<String>>(0)? else {
        return Ok(None);
    };
    let srid = if ctx.len() > 1 { ctx.get::<i64>(1)? } else { 0 };
    Ok(parse_geometry(&text).map(|_| encode(srid, &text)))
}

fn as_text(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    let stored = ctx.get::<Option<String>>(0)?;
    Ok(stored
        .as_deref()
        .and_then(decode)
        .map(|(_, text)| text.to_owned()))
}

/// `1` when the first geometry, a point, lies inside or on the boundary of
/// the second; `0` when it does not; `-1` for unusable input.
fn st_within(ctx: &Context<'_>) -> rusqlite::Result<i64> {
    let inner = ctx.get::<Option<String>>(0)?;
    let outer = ctx.get::<Option<String>>(1)?;
    let parsed = inner
        .as_deref()
        .and_then(decode)
        .and_then(|(_, text)| parse_geometry(text))
        .zip(
            outer
                .as_deref()
                .and_then(decode)
                .and_then(|(_, text)| parse_geometry(text)),
        );
    let Some((Geometry::Point(point), container)) = parsed else {
        return Ok(-1);
    };
    Ok(i64::from(container.intersects(&point)))
}

fn import_shp(ctx: &Context<'_>) -> rusqlite::Result<i64> {
    let base: String = ctx.get(0)?;
    let table: String = ctx.get(1)?;
    let _charset: String = ctx.get(2)?;
    let Ok(contents) = fs::read_to_string(format!("{base}.tsv")) else {
        return Ok(0);
    };
    let mut rows = Vec::new();
    for line in contents.lines().filter(|line| !line.trim().is_empty()) {
        let (name, geometry) = line
            .split_once('\t')
            .ok_or_else(|| user_error(format!("malformed shapefile row: {line}")))?;
        if parse_geometry(geometry).is_none() {
            return Err(user_error(format!("unreadable geometry for {name}")));
        }
        rows.push((name.to_owned(), encode(0, geometry)));
    }
    with_connection(ctx, |connection| {
        if table_exists(connection, &table)? {
            return Ok(0);
        }
        connection.execute_batch(&format!(
            "CREATE TABLE {} (
                PK_UID INTEGER PRIMARY KEY AUTOINCREMENT,
                NM_UF TEXT,
                geometry MULTIPOLYGON
            )",
            quote_identifier(&table)
        ))?;
        if table_exists(connection, "geometry_columns")? {
            register_geometry_column(connection, &table, "geometry", (6, 2), 0)?;
        }
        let insert = format!(
            "INSERT INTO {} (NM_UF, geometry) VALUES (?1, ?2)",
            quote_identifier(&table)
        );
        for (name, geometry) in &rows {
            connection.execute(&insert, (name, geometry))?;
        }
        i64::try_from(rows.len()).map_err(|_| user_error("too many rows"))
    })
}
