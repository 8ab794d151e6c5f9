//! Tests for the lookup scenario against the in-process stub extension.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use rstest::{fixture, rstest};
use spatialite_demo_core::test_support::StubSpatialite;
use spatialite_demo_core::{
    BRAZILIAN_LANDMARKS, DatabaseLocation, OpenOptions, SpatialConnection, SpatialExtension,
};
use tempfile::TempDir;

use super::*;
use crate::FailureKind;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/br_uf.tsv");

/// A temporary directory holding a stand-in `BR_UF_2022` shapefile.
struct Shapefile {
    _dir: TempDir,
    base: Utf8PathBuf,
}

#[fixture]
fn shapefile() -> Shapefile {
    let dir = TempDir::new().expect("tempdir");
    let base = Utf8PathBuf::from_path_buf(dir.path().join("BR_UF_2022")).expect("utf-8 path");
    for extension in ["shp", "shx", "dbf"] {
        fs::write(format!("{base}.{extension}"), b"").expect("write sidecar");
    }
    fs::copy(FIXTURE, format!("{base}.tsv")).expect("copy boundaries");
    Shapefile { _dir: dir, base }
}

#[fixture]
fn stub() -> StubSpatialite {
    StubSpatialite::new()
}

fn relaxed_session(stub: &StubSpatialite) -> SpatialConnection<'_> {
    stub.relax_security();
    let session =
        SpatialConnection::open(&DatabaseLocation::InMemory, stub, &OpenOptions::default())
            .expect("open database");
    ensure_spatial_metadata(session.connection().expect("open connection")).expect("bootstrap");
    session
}

#[rstest]
fn lookup_scenario_reports_each_place(shapefile: Shapefile, stub: StubSpatialite) {
    let location = DatabaseLocation::InMemory;
    let mut out = Vec::new();
    let report = run_lookup_scenario(
        &ScenarioContext::new(&location, &stub),
        &shapefile.base,
        &mut out,
    )
    .expect("lookup scenario");

    assert!(stub.is_relaxed());
    assert_eq!(report.metadata, MetadataStatus::Initialised);
    assert_eq!(report.import, ImportOutcome::Imported(4));
    let text = String::from_utf8(out).expect("utf-8 output");
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        [
            "Rio de Janeiro ---> Rio de Janeiro",
            "Foz do Iguacu ---> Paraná",
            "Fernando de Noronha ---> Pernambuco",
            "Null Island ---> Not found",
            "New York ---> Not found",
        ]
    );
    assert_eq!(stub.shutdown_count(), 1);
}

#[rstest]
fn brazilian_places_fall_inside_a_state(shapefile: Shapefile, stub: StubSpatialite) {
    let session = relaxed_session(&stub);
    let connection = session.connection().expect("open connection");
    import_shapefile(connection, &shapefile.base).expect("import");
    for place in &BRAZILIAN_LANDMARKS {
        assert!(
            locate_place(connection, place).expect("lookup").is_some(),
            "{} should be inside a state",
            place.label()
        );
    }
    for place in LOOKUP_PLACES.iter().skip(BRAZILIAN_LANDMARKS.len()) {
        assert_eq!(locate_place(connection, place).expect("lookup"), None);
    }
}

#[rstest]
fn existing_location_table_skips_the_import(stub: StubSpatialite) {
    let session = relaxed_session(&stub);
    let connection = session.connection().expect("open connection");
    connection
        .execute_batch("CREATE TABLE location (NM_UF TEXT, geometry TEXT)")
        .expect("create table");
    let outcome =
        import_shapefile(connection, Utf8Path::new("/nonexistent/BR_UF_2022")).expect("skip");
    assert_eq!(outcome, ImportOutcome::Skipped);
}

#[rstest]
fn missing_sidecars_are_reported(shapefile: Shapefile, stub: StubSpatialite) {
    fs::remove_file(format!("{}.shx", shapefile.base)).expect("remove sidecar");
    let session = relaxed_session(&stub);
    let err = import_shapefile(session.connection().expect("open connection"), &shapefile.base)
        .expect_err("sidecar missing");
    match &err {
        ScenarioError::MissingShapefile { missing, .. } => {
            assert_eq!(missing, &[Utf8PathBuf::from(format!("{}.shx", shapefile.base))]);
        }
        other => panic!("expected MissingShapefile, got {other:?}"),
    }
    assert_eq!(err.kind(), FailureKind::Import);
}

#[rstest]
fn import_without_relaxed_security_fails(shapefile: Shapefile, stub: StubSpatialite) {
    let session =
        SpatialConnection::open(&DatabaseLocation::InMemory, &stub, &OpenOptions::default())
            .expect("open database");
    let err = import_shapefile(session.connection().expect("open connection"), &shapefile.base)
        .expect_err("ImportSHP is unavailable");
    assert!(matches!(err, ScenarioError::Import { .. }), "got {err:?}");
}

#[rstest]
fn empty_import_is_rejected(shapefile: Shapefile, stub: StubSpatialite) {
    fs::write(format!("{}.tsv", shapefile.base), "").expect("truncate boundaries");
    let session = relaxed_session(&stub);
    let err = import_shapefile(session.connection().expect("open connection"), &shapefile.base)
        .expect_err("nothing imported");
    assert!(
        matches!(err, ScenarioError::ImportRejected { .. }),
        "got {err:?}"
    );
}

#[rstest]
fn lookup_before_import_is_a_query_error(stub: StubSpatialite) {
    let session = relaxed_session(&stub);
    let rio = LOOKUP_PLACES.first().expect("fixture places");
    let err = locate_place(session.connection().expect("open connection"), rio)
        .expect_err("no location table");
    assert!(
        matches!(err, ScenarioError::Query { label: "Rio de Janeiro", .. }),
        "got {err:?}"
    );
}

#[rstest]
fn failed_scenario_still_shuts_down_once(stub: StubSpatialite) {
    let location = DatabaseLocation::InMemory;
    let err = run_lookup_scenario(
        &ScenarioContext::new(&location, &stub),
        Utf8Path::new("/nonexistent/BR_UF_2022"),
        &mut std::io::sink(),
    )
    .expect_err("shapefile missing");
    assert_eq!(err.kind(), FailureKind::Import);
    assert_eq!(stub.shutdown_count(), 1);
}
