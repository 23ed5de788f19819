//! The `stack` subcommand for the pagewise binary

use super::PagewiseSubcommandDispatcher;
use anyhow::Result;
use clap::Args;
use pagewise_host::{
    default_schedule, ensure_fits_stack, measure_stack_growth, run_on_stack, StackSample,
};

/// Command line arguments for `pagewise stack`
#[derive(Args, Debug)]
#[command(author, version, about)]
pub(crate) struct StackArgs {
    /// The recursion depths to measure. Defaults to 1 through 10, then 100, 1000 and 10000.
    #[arg(long, short)]
    levels: Vec<u64>,

    /// The stack size of the measuring thread, in MiB.
    #[arg(long, default_value_t = 64)]
    stack_mib: usize,

    /// Print the samples as JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl PagewiseSubcommandDispatcher for StackArgs {
    fn dispatch(self) -> Result<()> {
        let levels = if self.levels.is_empty() { default_schedule() } else { self.levels };
        ensure_fits_stack(&levels, self.stack_mib << 20)?;

        tracing::info!(target: "pagewise-cli::stack", "Measuring {} recursion depths on a {} MiB stack", levels.len(), self.stack_mib);
        let samples: Vec<StackSample> = run_on_stack(self.stack_mib << 20, move || {
            levels.into_iter().map(measure_stack_growth).collect::<Vec<_>>()
        })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&samples)?);
            return Ok(());
        }

        println!();
        let mut previous: Option<u64> = None;
        for sample in samples {
            if previous.is_some_and(|levels| sample.levels > levels + 1) {
                println!("...");
            }
            println!(
                "stack pointer moves by {} bytes from {} recursive calls",
                sample.bytes, sample.levels
            );
            previous = Some(sample.levels);
        }

        Ok(())
    }
}
