//! `out` step of the email resource
//!
//! Usage: `out <source-root>`. Reads the JSON input on stdin and writes the
//! JSON output record on stdout. Diagnostics go to stderr.

use std::{
    env,
    error::Error,
    io::{self, Read, Write},
    path::PathBuf,
    process::ExitCode,
};

use tracing_subscriber::EnvFilter;

fn run() -> Result<(), Box<dyn Error>> {
    let source_root = env::args_os().nth(1).map(PathBuf::from).unwrap_or_default();

    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input)?;

    let output = email_resource::execute(&source_root, env!("CARGO_PKG_VERSION"), &input)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
