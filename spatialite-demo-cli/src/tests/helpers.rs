//! Test helpers: a shareable stub extension and a stand-in shapefile.

use super::*;
use rusqlite::Connection;
use spatialite_demo_core::test_support::StubSpatialite;
use spatialite_demo_core::{EngineError, ExtensionContext, SpatialConnection};
use std::{
    fs,
    sync::{Arc, Mutex, MutexGuard},
};
use tempfile::TempDir;

const BOUNDARIES: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../spatialite-demo-scenarios/tests/fixtures/br_uf.tsv"
);

/// Hands out extensions that share one [`StubSpatialite`] journal.
#[derive(Debug, Default, Clone)]
pub(super) struct StubBuilder {
    stub: Arc<StubSpatialite>,
}

impl StubBuilder {
    pub(super) fn stub(&self) -> &StubSpatialite {
        &self.stub
    }
}

impl ExtensionBuilder for StubBuilder {
    fn build(&self, _config: &EngineConfig) -> Box<dyn SpatialExtension> {
        Box::new(SharedStub(Arc::clone(&self.stub)))
    }
}

struct SharedStub(Arc<StubSpatialite>);

impl SpatialExtension for SharedStub {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn relax_security(&self) {
        self.0.relax_security();
    }

    fn attach(&self, connection: &Connection) -> Result<ExtensionContext, EngineError> {
        self.0.attach(connection)
    }

    fn release(&self, context: ExtensionContext) {
        self.0.release(context);
    }

    fn shutdown(&self) {
        self.0.shutdown();
    }
}

/// A scratch directory for database files and a stand-in shapefile.
pub(super) struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub(super) fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().join(name)).expect("utf-8 temp path")
    }

    /// Write `BR_UF_2022` sidecars and boundaries; returns the base path.
    pub(super) fn shapefile(&self) -> Utf8PathBuf {
        let base = self.path("BR_UF_2022");
        for extension in ["shp", "shx", "dbf"] {
            fs::write(format!("{base}.{extension}"), b"").expect("write sidecar");
        }
        fs::copy(BOUNDARIES, format!("{base}.tsv")).expect("copy boundaries");
        base
    }

    /// Names of the files currently in the workspace, sorted.
    pub(super) fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path())
            .expect("list workspace")
            .map(|entry| {
                entry
                    .expect("read workspace entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Make the workspace the process working directory until the guard drops.
    pub(super) fn enter(&self) -> CurrentDir {
        let lock = CURRENT_DIR_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = std::env::current_dir().expect("current directory");
        std::env::set_current_dir(self.dir.path()).expect("enter workspace");
        CurrentDir {
            previous,
            _lock: lock,
        }
    }
}

static CURRENT_DIR_LOCK: Mutex<()> = Mutex::new(());

/// Restores the previous working directory on drop.
pub(super) struct CurrentDir {
    previous: std::path::PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl Drop for CurrentDir {
    fn drop(&mut self) {
        std::env::set_current_dir(&self.previous).expect("restore working directory");
    }
}

pub(super) fn args(extra: &[&str]) -> Vec<String> {
    std::iter::once("spatialite-demo")
        .chain(extra.iter().copied())
        .map(str::to_owned)
        .collect()
}

pub(super) fn count_points(path: &Utf8PathBuf) -> String {
    let stub = StubSpatialite::new();
    let session = SpatialConnection::open(
        &DatabaseLocation::File(path.clone()),
        &stub,
        &OpenOptions::default(),
    )
    .expect("reopen database");
    session
        .query_one("SELECT COUNT(*) FROM points", [])
        .expect("count points")
        .and_then(|row| row.first().map(str::to_owned))
        .expect("one row")
}

pub(super) fn output_lines(out: &[u8]) -> Vec<String> {
    String::from_utf8(out.to_vec())
        .expect("utf-8 output")
        .lines()
        .map(str::to_owned)
        .collect()
}
