//! Engine adapter and catalog probes for the SpatiaLite demo.
//!
//! The crate wraps a `rusqlite` connection together with the spatial
//! extension that was attached to it, so callers get one handle whose
//! teardown always runs in the same order: close the connection, release the
//! extension context, then shut the extension down.
//!
//! Responsibilities:
//! - Open in-memory or file-backed databases and attach the spatial extension.
//! - Run statements through the bind API and materialise single rows as text.
//! - Probe the master catalog and the spatial catalog.
//! - Provide the fixed place fixtures used by both scenarios.
//!
//! Boundaries:
//! - Scenario orchestration lives in `spatialite-demo-scenarios`.
//! - No geometry algorithms run here; the extension owns them.
#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod place;
pub mod probe;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{DEFAULT_EXTENSION_LIBRARY, EngineConfig, OpenOptions};
pub use engine::{
    DatabaseLocation, EngineError, EngineVersions, ExtensionContext, IN_MEMORY, ModSpatialite,
    QueryRow, SECURITY_ENV, SpatialConnection, SpatialExtension, exec, execute, query_one,
};
pub use place::{BRAZILIAN_LANDMARKS, LOOKUP_PLACES, Place, WGS84_SRID};
pub use probe::{
    GeometryColumn, SPATIAL_REF_SYS, geometry_column, spatial_metadata_exists, table_exists,
};
