//! The `pagewise` binary.

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use subcommands::{PagewiseSubcommand, PagewiseSubcommandDispatcher};
use tracing::Level;

mod subcommands;

/// Demos of virtual memory: address decomposition, stack growth and multi-level paging.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Verbosity level (0-3)
    #[arg(long, short, action = ArgAction::Count)]
    v: u8,

    /// The subcommand to run
    #[command(subcommand)]
    subcommand: PagewiseSubcommand,
}

fn main() -> Result<()> {
    let Args { v, subcommand } = Args::parse();
    init_tracing_subscriber(v)?;
    subcommand.dispatch()
}

/// Initializes the tracing subscriber, writing to stderr.
///
/// # Arguments
/// * `verbosity_level` - The verbosity level (0-3)
fn init_tracing_subscriber(verbosity_level: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(match verbosity_level {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}
