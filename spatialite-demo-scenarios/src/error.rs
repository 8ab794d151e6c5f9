//! Errors raised while running a demo scenario.
//!
//! Each variant names the step that failed; [`ScenarioError::kind`] folds
//! them into the coarse taxonomy the CLI reports against.

use std::io;

use camino::Utf8PathBuf;
use spatialite_demo_core::EngineError;
use thiserror::Error;

/// Coarse classification of a scenario failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The database could not be opened or the extension attached.
    Open,
    /// The master catalog could not be queried.
    Probe,
    /// Spatial metadata could not be created.
    Bootstrap,
    /// A table or geometry column could not be created.
    Schema,
    /// The insert transaction failed.
    Transaction,
    /// The shapefile could not be imported.
    Import,
    /// A lookup query failed.
    Query,
    /// Scenario output could not be written.
    Output,
}

/// Errors raised by the seed and lookup scenarios.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Opening the database or attaching the extension failed.
    #[error("failed to open database: {source}")]
    Open {
        /// Source error returned by the engine adapter.
        #[source]
        source: EngineError,
    },
    /// Probing the master catalog failed.
    #[error("failed to check for spatial metadata: {source}")]
    Probe {
        /// Source error returned by the catalog query.
        #[source]
        source: EngineError,
    },
    /// `InitSpatialMetaData` raised an error.
    #[error("failed to initialise spatial metadata: {source}")]
    Bootstrap {
        /// Source error returned by `InitSpatialMetaData`.
        #[source]
        source: EngineError,
    },
    /// `InitSpatialMetaData` ran but did not report success.
    #[error("spatial metadata initialisation returned {result}")]
    BootstrapRejected {
        /// Text of the returned value, `NULL` when absent.
        result: String,
    },
    /// A schema statement failed.
    #[error("schema step {operation} failed: {source}")]
    Schema {
        /// Schema step that failed.
        operation: &'static str,
        /// Source error returned by the engine.
        #[source]
        source: EngineError,
    },
    /// `AddGeometryColumn` refused and the column is not already registered.
    #[error("failed to add geometry column {table}.{column}")]
    GeometryColumnRejected {
        /// Table the column belongs to.
        table: &'static str,
        /// Geometry column name.
        column: &'static str,
    },
    /// Starting, filling or committing the insert transaction failed.
    #[error("transaction step {operation} failed: {source}")]
    Transaction {
        /// Transaction step that failed.
        operation: &'static str,
        /// Source error returned by the engine.
        #[source]
        source: EngineError,
    },
    /// `ImportSHP` raised an error.
    #[error("failed to import shapefile {path}: {source}")]
    Import {
        /// Shapefile base path.
        path: Utf8PathBuf,
        /// Source error returned by `ImportSHP`.
        #[source]
        source: EngineError,
    },
    /// The shapefile sidecars could not be inspected.
    #[error("failed to inspect shapefile {path}: {source}")]
    InspectShapefile {
        /// Shapefile base path.
        path: Utf8PathBuf,
        /// Source error returned by the filesystem.
        #[source]
        source: io::Error,
    },
    /// One or more shapefile components are absent.
    #[error("shapefile {path} is incomplete; missing {}", format_paths(missing))]
    MissingShapefile {
        /// Shapefile base path.
        path: Utf8PathBuf,
        /// Components that were not found.
        missing: Vec<Utf8PathBuf>,
    },
    /// `ImportSHP` returned NULL or imported no rows.
    #[error("shapefile import from {path} loaded no rows")]
    ImportRejected {
        /// Shapefile base path.
        path: Utf8PathBuf,
    },
    /// A lookup query failed.
    #[error("failed to look up {label}: {source}")]
    Query {
        /// Label of the place being looked up.
        label: &'static str,
        /// Source error returned by the engine.
        #[source]
        source: EngineError,
    },
    /// Writing scenario output failed.
    #[error("failed to write scenario output: {source}")]
    Output {
        /// Source error returned by the writer.
        #[from]
        source: io::Error,
    },
}

impl ScenarioError {
    /// Taxonomy bucket for this failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Open { .. } => FailureKind::Open,
            Self::Probe { .. } => FailureKind::Probe,
            Self::Bootstrap { .. } | Self::BootstrapRejected { .. } => FailureKind::Bootstrap,
            Self::Schema { .. } | Self::GeometryColumnRejected { .. } => FailureKind::Schema,
            Self::Transaction { .. } => FailureKind::Transaction,
            Self::Import { .. }
            | Self::InspectShapefile { .. }
            | Self::MissingShapefile { .. }
            | Self::ImportRejected { .. } => FailureKind::Import,
            Self::Query { .. } => FailureKind::Query,
            Self::Output { .. } => FailureKind::Output,
        }
    }
}

fn format_paths(paths: &[Utf8PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn missing_shapefile_lists_components() {
        let err = ScenarioError::MissingShapefile {
            path: Utf8PathBuf::from("../shp/BR_UF_2022"),
            missing: vec![
                Utf8PathBuf::from("../shp/BR_UF_2022.shx"),
                Utf8PathBuf::from("../shp/BR_UF_2022.dbf"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "shapefile ../shp/BR_UF_2022 is incomplete; missing \
             ../shp/BR_UF_2022.shx, ../shp/BR_UF_2022.dbf"
        );
        assert_eq!(err.kind(), FailureKind::Import);
    }

    #[rstest]
    #[case(
        ScenarioError::BootstrapRejected { result: "0".to_owned() },
        FailureKind::Bootstrap
    )]
    #[case(
        ScenarioError::GeometryColumnRejected { table: "points", column: "geom" },
        FailureKind::Schema
    )]
    #[case(
        ScenarioError::ImportRejected { path: Utf8PathBuf::from("x") },
        FailureKind::Import
    )]
    #[case(
        ScenarioError::from(io::Error::other("closed pipe")),
        FailureKind::Output
    )]
    fn variants_map_to_their_kind(#[case] err: ScenarioError, #[case] kind: FailureKind) {
        assert_eq!(err.kind(), kind);
    }
}
