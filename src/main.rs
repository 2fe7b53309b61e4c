//! Atom and AtomPub document tool.

use anyhow::Result;
use atom_tools::cli::{Cli, Parser};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.opts.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    atom_tools::cli::run(&cli.command, &cli.opts, &mut std::io::stdout().lock())
}
