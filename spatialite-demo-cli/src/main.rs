//! Entry point for the SpatiaLite demo.
#![forbid(unsafe_code)]

use std::io::{self, Write};

use spatialite_demo_cli::{
    CliError, DefaultExtensionBuilder, Invocation, execute, init_logging, parse_args, write_usage,
};

#[expect(
    clippy::print_stderr,
    reason = "the binary reports fatal errors on stderr"
)]
fn main() {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = run(&mut out) {
        drop(out.flush());
        eprintln!("spatialite-demo: {err}");
        std::process::exit(1);
    }
}

fn run(out: &mut dyn Write) -> Result<(), CliError> {
    match parse_args(std::env::args_os())? {
        Invocation::Help => write_usage(out),
        Invocation::Run(config) => {
            init_logging(config.verbose)?;
            execute(&config, &DefaultExtensionBuilder, out)
        }
    }
}
