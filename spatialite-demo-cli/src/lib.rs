//! Command-line driver for the SpatiaLite demo scenarios.
#![forbid(unsafe_code)]

mod error;
mod logging;

use std::ffi::OsString;
use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{CommandFactory, Parser};
use log::{debug, info};
use spatialite_demo_core::{
    DEFAULT_EXTENSION_LIBRARY, DatabaseLocation, EngineConfig, ModSpatialite, OpenOptions,
    SpatialExtension,
};
use spatialite_demo_scenarios::{
    DEFAULT_SHAPEFILE, Scenario, ScenarioContext, run_lookup_scenario, run_seed_scenario,
};

pub use error::CliError;
pub use logging::{LOG_ENV, init_logging, log_filter};

const ARG_EXTENSION: &str = "extension";
const ARG_BUSY_TIMEOUT: &str = "busy-timeout-ms";
/// Environment variable naming the spatial extension library.
pub const ENV_EXTENSION: &str = "SPATIALITE_DEMO_EXTENSION";
/// Environment variable holding the busy timeout in milliseconds.
pub const ENV_BUSY_TIMEOUT: &str = "SPATIALITE_DEMO_BUSY_TIMEOUT_MS";
const MISSING_ID: &str = "(none)";

#[derive(Debug, Parser)]
#[command(
    name = "spatialite-demo",
    about = "Run one of the SpatiaLite demo scenarios",
    disable_help_flag = true,
    args_override_self = true
)]
struct Cli {
    /// Show this help message.
    #[arg(short = 'h', long = "help")]
    help: bool,
    /// ID of the example to run (1 or 2).
    #[arg(short = 'i', long = "example-id", value_name = "id")]
    example_id: Option<String>,
    /// Name of the database file (if not provided, in-memory).
    #[arg(short = 'n', long = "db-name", value_name = "name")]
    db_name: Option<Utf8PathBuf>,
    /// Spatial extension library to load.
    #[arg(
        long = ARG_EXTENSION,
        value_name = "path",
        env = ENV_EXTENSION,
        default_value = DEFAULT_EXTENSION_LIBRARY
    )]
    extension: String,
    /// How long to wait on a locked database, in milliseconds.
    #[arg(long = ARG_BUSY_TIMEOUT, value_name = "ms", env = ENV_BUSY_TIMEOUT)]
    busy_timeout_ms: Option<u64>,
    /// Log progress at debug level.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
    #[arg(hide = true, value_name = "argument")]
    unexpected: Vec<String>,
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print usage and exit successfully.
    Help,
    /// Run a scenario.
    Run(RunConfig),
}

/// Fully resolved settings for one scenario run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Scenario to run.
    pub scenario: Scenario,
    /// Database to run it against.
    pub location: DatabaseLocation,
    /// Spatial extension settings.
    pub engine: EngineConfig,
    /// Shapefile base path for the lookup scenario.
    pub shapefile: Utf8PathBuf,
    /// Whether debug logging was requested.
    pub verbose: bool,
}

/// Outcome of a successful [`run_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Usage was printed.
    Help,
    /// The scenario ran to completion.
    Completed(Scenario),
}

/// Creates the spatial extension a run attaches.
pub trait ExtensionBuilder {
    /// Build the extension described by `config`.
    fn build(&self, config: &EngineConfig) -> Box<dyn SpatialExtension>;
}

/// Builds [`ModSpatialite`] from the engine configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExtensionBuilder;

impl ExtensionBuilder for DefaultExtensionBuilder {
    fn build(&self, config: &EngineConfig) -> Box<dyn SpatialExtension> {
        Box::new(ModSpatialite::from_config(config))
    }
}

/// Interpret command-line arguments, the first being the program name.
///
/// Unknown options and malformed option values fall back to
/// [`Invocation::Help`].
///
/// # Errors
/// Returns [`CliError::UnexpectedArgument`] for positional arguments and
/// [`CliError::UnknownExample`] when `--example-id` is missing or unknown.
pub fn parse_args<I, T>(args: I) -> Result<Invocation, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            debug!("argument parsing failed: {err}");
            return Ok(Invocation::Help);
        }
    };
    if cli.help {
        return Ok(Invocation::Help);
    }
    if let Some(argument) = cli.unexpected.into_iter().next() {
        return Err(CliError::UnexpectedArgument { argument });
    }
    let scenario = resolve_scenario(cli.example_id.as_deref())?;
    let engine = EngineConfig {
        extension_library: cli.extension,
        entry_point: None,
        open: cli
            .busy_timeout_ms
            .map(Duration::from_millis)
            .map_or_else(OpenOptions::default, OpenOptions::with_busy_timeout),
    };
    Ok(Invocation::Run(RunConfig {
        scenario,
        location: DatabaseLocation::from_name(cli.db_name),
        engine,
        shapefile: Utf8PathBuf::from(DEFAULT_SHAPEFILE),
        verbose: cli.verbose,
    }))
}

fn resolve_scenario(id: Option<&str>) -> Result<Scenario, CliError> {
    let raw = id.unwrap_or(MISSING_ID);
    raw.trim()
        .parse::<u32>()
        .ok()
        .and_then(Scenario::from_id)
        .ok_or_else(|| CliError::UnknownExample { id: raw.to_owned() })
}

/// Write the usage message to `out`.
///
/// # Errors
/// Returns [`CliError::WriteOutput`] when `out` fails.
pub fn write_usage(out: &mut dyn Write) -> Result<(), CliError> {
    let usage = Cli::command().render_help();
    write!(out, "{usage}").map_err(CliError::WriteOutput)
}

/// Run the configured scenario and write `Example <n> Done.` on success.
///
/// # Errors
/// Returns [`CliError::Scenario`] when the scenario fails and
/// [`CliError::WriteOutput`] when the completion line cannot be written.
pub fn execute(
    config: &RunConfig,
    builder: &dyn ExtensionBuilder,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let extension = builder.build(&config.engine);
    let context =
        ScenarioContext::new(&config.location, extension.as_ref()).with_options(config.engine.open);
    info!("running {} against {}", config.scenario, config.location);
    let result = match config.scenario {
        Scenario::Seed => run_seed_scenario(&context, out).map(|report| {
            debug!("seed report: {report:?}");
        }),
        Scenario::Lookup => run_lookup_scenario(&context, &config.shapefile, out).map(|report| {
            debug!("lookup report: {report:?}");
        }),
    };
    result.map_err(|source| CliError::Scenario {
        scenario: config.scenario,
        source,
    })?;
    writeln!(out, "{} Done.", config.scenario).map_err(CliError::WriteOutput)
}

/// Parse `args`, then print usage or run the selected scenario.
///
/// Logging is left to the caller; the binary installs it between parsing
/// and running so `--verbose` takes effect.
///
/// # Errors
/// See [`parse_args`], [`write_usage`] and [`execute`].
pub fn run_with<I, T>(
    args: I,
    builder: &dyn ExtensionBuilder,
    out: &mut dyn Write,
) -> Result<Outcome, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match parse_args(args)? {
        Invocation::Help => {
            write_usage(out)?;
            Ok(Outcome::Help)
        }
        Invocation::Run(config) => {
            execute(&config, builder, out)?;
            Ok(Outcome::Completed(config.scenario))
        }
    }
}

#[cfg(test)]
mod tests;
