//! Error types emitted by the demo CLI.

use std::io;

use spatialite_demo_scenarios::{Scenario, ScenarioError};
use thiserror::Error;

/// Errors emitted by the demo CLI. Each one ends the process with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    /// `--example-id` was missing, non-numeric or not a known scenario.
    #[error("Unknown example ID: {id}")]
    UnknownExample {
        /// The id as given, or `(none)`.
        id: String,
    },
    /// A positional argument was supplied.
    #[error("Unexpected argument: {argument}")]
    UnexpectedArgument {
        /// The first positional argument.
        argument: String,
    },
    /// The log subscriber could not be installed.
    #[error("failed to initialise logging: {0}")]
    InitLogging(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    /// The selected scenario failed.
    #[error("{scenario} failed: {source}")]
    Scenario {
        /// Scenario that was running.
        scenario: Scenario,
        /// Source error returned by the scenario.
        #[source]
        source: ScenarioError,
    },
    /// Writing usage or the completion line failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] io::Error),
}
