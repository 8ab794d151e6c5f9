//! Tests for the seed scenario against the in-process stub extension.

use std::io;

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use spatialite_demo_core::test_support::{LifecycleEvent, StubSpatialite};
use spatialite_demo_core::{
    DatabaseLocation, EngineError, ExtensionContext, OpenOptions, SpatialConnection,
    SpatialExtension,
};
use tempfile::TempDir;

use super::*;
use crate::FailureKind;

#[fixture]
fn stub() -> StubSpatialite {
    StubSpatialite::new()
}

fn file_location(dir: &TempDir) -> DatabaseLocation {
    DatabaseLocation::File(
        Utf8PathBuf::from_path_buf(dir.path().join("t.db")).expect("utf-8 temp path"),
    )
}

fn count_points(location: &DatabaseLocation) -> i64 {
    let stub = StubSpatialite::new();
    let session =
        SpatialConnection::open(location, &stub, &OpenOptions::default()).expect("reopen");
    session
        .connection()
        .expect("open connection")
        .query_row("SELECT COUNT(*) FROM points", [], |row| row.get(0))
        .expect("count points")
}

fn prepared_session(stub: &StubSpatialite) -> SpatialConnection<'_> {
    let session =
        SpatialConnection::open(&DatabaseLocation::InMemory, stub, &OpenOptions::default())
            .expect("open database");
    let connection = session.connection().expect("open connection");
    ensure_spatial_metadata(connection).expect("bootstrap");
    create_points_table(connection).expect("create table");
    register_geometry_column(connection).expect("register column");
    session
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Attaches without registering any spatial functions.
struct BareExtension;

impl SpatialExtension for BareExtension {
    fn name(&self) -> &str {
        "bare"
    }

    fn relax_security(&self) {}

    fn attach(&self, _connection: &rusqlite::Connection) -> Result<ExtensionContext, EngineError> {
        Ok(ExtensionContext::new("bare", 0))
    }

    fn release(&self, _context: ExtensionContext) {}

    fn shutdown(&self) {}
}

#[rstest]
fn unusable_extension_is_an_open_failure() {
    let location = DatabaseLocation::InMemory;
    let extension = BareExtension;
    let mut out = Vec::new();
    let err = run_seed_scenario(&ScenarioContext::new(&location, &extension), &mut out)
        .expect_err("spatialite_version is not registered");
    assert!(matches!(err, ScenarioError::Open { .. }), "got {err:?}");
    assert_eq!(err.kind(), FailureKind::Open);
    assert!(out.is_empty());
}

#[rstest]
fn seeds_an_in_memory_database(stub: StubSpatialite) {
    let location = DatabaseLocation::InMemory;
    let mut out = Vec::new();
    let report = run_seed_scenario(&ScenarioContext::new(&location, &stub), &mut out)
        .expect("seed scenario");
    assert_eq!(
        report,
        SeedReport {
            metadata: MetadataStatus::Initialised,
            geometry: GeometryRegistration::Registered,
            inserted: 3,
        }
    );
    let text = String::from_utf8(out).expect("utf-8 output");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines,
        [
            format!("SQLite version: {}", rusqlite::version()).as_str(),
            "Spatialite version: stub-spatialite",
            "Adding Rio de Janeiro: POINT(-43.1729 -22.9068)",
            "Adding Foz do Iguacu: POINT(-54.5854 -25.5165)",
            "Adding Fernando de Noronha: POINT(-32.423786 -3.853808)",
        ]
    );
    assert_eq!(stub.shutdown_count(), 1);
}

#[rstest]
fn rerunning_against_a_file_appends_the_same_rows(stub: StubSpatialite) {
    let dir = TempDir::new().expect("tempdir");
    let location = file_location(&dir);
    let context = ScenarioContext::new(&location, &stub);

    run_seed_scenario(&context, &mut io::sink()).expect("first run");
    assert_eq!(count_points(&location), 3);

    let second = run_seed_scenario(&context, &mut io::sink()).expect("second run");
    assert_eq!(second.metadata, MetadataStatus::AlreadyPresent);
    assert_eq!(second.geometry, GeometryRegistration::AlreadyRegistered);
    assert_eq!(second.inserted, 3);
    assert_eq!(count_points(&location), 6);
    assert_eq!(stub.shutdown_count(), 2);
}

#[rstest]
fn registers_geom_as_wgs84_xy_points(stub: StubSpatialite) {
    let session = prepared_session(&stub);
    let column = geometry_column(
        session.connection().expect("open connection"),
        POINTS_TABLE,
        GEOMETRY_COLUMN,
    )
    .expect("query catalog")
    .expect("column registered");
    assert!(column.is_xy_point(WGS84_SRID));
}

#[rstest]
fn stores_geometries_in_fixture_order(stub: StubSpatialite) {
    let mut session = prepared_session(&stub);
    let inserted = insert_places(
        session.connection_mut().expect("open connection"),
        &BRAZILIAN_LANDMARKS,
        &mut io::sink(),
    )
    .expect("insert places");
    assert_eq!(inserted, 3);
    let row = session
        .query_one("SELECT AsText(geom) FROM points ORDER BY id LIMIT 1", [])
        .expect("read back")
        .expect("one row");
    assert_eq!(row.first(), Some("POINT(-43.1729 -22.9068)"));
}

#[rstest]
fn failed_insert_rolls_back_the_batch(stub: StubSpatialite) {
    let mut session = prepared_session(&stub);
    session
        .exec(
            "CREATE TRIGGER cap_points BEFORE INSERT ON points
             WHEN (SELECT COUNT(*) FROM points) >= 2
             BEGIN SELECT RAISE(ABORT, 'points table is full'); END;",
        )
        .expect("create trigger");

    let err = insert_places(
        session.connection_mut().expect("open connection"),
        &BRAZILIAN_LANDMARKS,
        &mut io::sink(),
    )
    .expect_err("third insert aborts");
    assert_eq!(err.kind(), FailureKind::Transaction);
    assert!(err.to_string().contains("points table is full"), "{err}");

    let row = session
        .query_one("SELECT COUNT(*) FROM points", [])
        .expect("count")
        .expect("one row");
    assert_eq!(row.first(), Some("0"));
}

#[rstest]
fn geometry_column_needs_the_table(stub: StubSpatialite) {
    let session =
        SpatialConnection::open(&DatabaseLocation::InMemory, &stub, &OpenOptions::default())
            .expect("open database");
    let connection = session.connection().expect("open connection");
    ensure_spatial_metadata(connection).expect("bootstrap");
    let err = register_geometry_column(connection).expect_err("no points table");
    assert!(
        matches!(err, ScenarioError::GeometryColumnRejected { .. }),
        "got {err:?}"
    );
}

#[rstest]
fn output_failure_still_tears_down(stub: StubSpatialite) {
    let location = DatabaseLocation::InMemory;
    let err = run_seed_scenario(&ScenarioContext::new(&location, &stub), &mut BrokenPipe)
        .expect_err("stdout closed");
    assert_eq!(err.kind(), FailureKind::Output);
    assert_eq!(
        stub.events(),
        vec![
            LifecycleEvent::Attached(0),
            LifecycleEvent::ConnectionClosed(0),
            LifecycleEvent::ContextReleased(0),
            LifecycleEvent::Shutdown,
        ]
    );
}
