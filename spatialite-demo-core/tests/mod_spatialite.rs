//! Checks against the native `mod_spatialite` library.
//!
//! These need SpatiaLite installed where SQLite's loader can find it, so they
//! are ignored by default. Run them with `cargo test -- --ignored`.

use rstest::rstest;
use spatialite_demo_core::{
    DatabaseLocation, EngineConfig, ModSpatialite, SpatialConnection, WGS84_SRID,
    geometry_column, spatial_metadata_exists,
};

fn open(extension: &ModSpatialite) -> SpatialConnection<'_> {
    SpatialConnection::open(
        &DatabaseLocation::InMemory,
        extension,
        &EngineConfig::default().open,
    )
    .expect("load mod_spatialite")
}

#[rstest]
#[ignore = "requires the mod_spatialite shared library"]
fn reports_the_spatialite_version() {
    let extension = ModSpatialite::from_config(&EngineConfig::default());
    let session = open(&extension);
    let versions = session.versions().expect("query versions");
    assert!(versions.spatialite.is_some_and(|version| !version.is_empty()));
}

#[rstest]
#[ignore = "requires the mod_spatialite shared library"]
fn bootstraps_metadata_and_registers_points() {
    let extension = ModSpatialite::from_config(&EngineConfig::default());
    let session = open(&extension);
    let connection = session.connection().expect("open connection");
    assert!(!spatial_metadata_exists(connection).expect("probe"));
    session
        .exec("SELECT InitSpatialMetaData(1)")
        .expect("bootstrap metadata");
    assert!(spatial_metadata_exists(connection).expect("probe"));

    session
        .exec("CREATE TABLE points (id INTEGER PRIMARY KEY AUTOINCREMENT)")
        .expect("create table");
    session
        .exec("SELECT AddGeometryColumn('points', 'geom', 4326, 'POINT', 'XY')")
        .expect("register column");
    let column = geometry_column(connection, "points", "geom")
        .expect("query catalog")
        .expect("column registered");
    assert!(column.is_xy_point(WGS84_SRID));
}

#[rstest]
#[ignore = "requires the mod_spatialite shared library"]
fn missing_library_is_reported() {
    let extension = ModSpatialite::new("definitely_not_a_spatial_library");
    let err = SpatialConnection::open(
        &DatabaseLocation::InMemory,
        &extension,
        &EngineConfig::default().open,
    )
    .expect_err("library is absent");
    assert!(err.to_string().contains("definitely_not_a_spatial_library"));
}
