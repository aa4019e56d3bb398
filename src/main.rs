use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;
use whtax::interfaces::cli::{Cli, run};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let stdout = io::stdout();
    run(cli, &mut stdout.lock()).into_diagnostic()?;
    Ok(())
}
