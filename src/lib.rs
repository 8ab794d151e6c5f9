//! Facade crate for the SpatiaLite demo.
//!
//! This crate re-exports the engine adapter, the place fixtures and both demo
//! scenarios. The in-process stub extension is available behind the
//! `test-support` feature.

#![forbid(unsafe_code)]

pub use spatialite_demo_core::{
    BRAZILIAN_LANDMARKS, DatabaseLocation, EngineConfig, EngineError, EngineVersions,
    ExtensionContext, LOOKUP_PLACES, ModSpatialite, OpenOptions, Place, QueryRow,
    SpatialConnection, SpatialExtension, WGS84_SRID,
};

pub use spatialite_demo_scenarios::{
    FailureKind, ImportOutcome, Lookup, LookupReport, MetadataStatus, Scenario, ScenarioContext,
    ScenarioError, SeedReport, run_lookup_scenario, run_seed_scenario,
};

#[cfg(feature = "test-support")]
pub use spatialite_demo_core::test_support;
