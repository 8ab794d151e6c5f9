//! The two SpatiaLite demo scenarios.
//!
//! Scenario 1 seeds a point table with Brazilian landmarks inside one
//! transaction. Scenario 2 imports Brazilian state boundaries from a
//! shapefile and reports which state each of a handful of places lies in.
//!
//! Both open their own connection through [`ScenarioContext`], bootstrap the
//! spatial catalog when it is missing, write their progress lines to a
//! caller-supplied writer and close the connection before returning.

mod context;
mod error;
pub mod lookup;
pub mod seed;

use std::fmt;

pub use context::{MetadataStatus, ScenarioContext, ensure_spatial_metadata};
pub use error::{FailureKind, ScenarioError};
pub use lookup::{
    DEFAULT_SHAPEFILE, ImportOutcome, LOCATION_TABLE, Lookup, LookupReport, import_shapefile,
    locate_place, run_lookup_scenario,
};
pub use seed::{
    GEOMETRY_COLUMN, GeometryRegistration, POINTS_TABLE, SeedReport, create_points_table,
    insert_places, register_geometry_column, run_seed_scenario,
};

/// A runnable scenario, selected by its numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Id `1`: seed the point table.
    Seed,
    /// Id `2`: import state boundaries and look places up.
    Lookup,
}

impl Scenario {
    /// Scenario for a numeric id, if one exists.
    #[must_use]
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Seed),
            2 => Some(Self::Lookup),
            _ => None,
        }
    }

    /// Numeric id of the scenario.
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::Seed => 1,
            Self::Lookup => 2,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Example {}", self.id())
    }
}
