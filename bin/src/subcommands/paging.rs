//! The `paging` subcommand for the pagewise binary

use super::PagewiseSubcommandDispatcher;
use anyhow::Result;
use clap::Args;
use pagewise_paging::{
    lab::{figure_three, LAB_PID, LAB_VIRTUAL_ADDRESS},
    PagingSimulation,
};

/// Command line arguments for `pagewise paging`
#[derive(Args, Debug)]
#[command(author, version, about)]
pub(crate) struct PagingArgs {
    /// The size of simulated physical memory, in MiB.
    #[arg(long, default_value_t = 128)]
    ram_mib: usize,

    /// The number of offset bits in a virtual address. The worked example needs 12.
    #[arg(long, default_value_t = 12)]
    offset_bits: u32,

    /// The number of translations the TLB holds.
    #[arg(long, default_value_t = 512)]
    tlb_entries: usize,

    /// Print the outcome and memory report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl PagewiseSubcommandDispatcher for PagingArgs {
    fn dispatch(self) -> Result<()> {
        let mut sim = PagingSimulation::builder()
            .with_ram_bytes(self.ram_mib << 20)
            .with_offset_bits(self.offset_bits)
            .with_tlb_capacity(self.tlb_entries)
            .build()?;

        tracing::info!(target: "pagewise-cli::paging", "Running the worked example in pid {LAB_PID}");
        let outcome = figure_three(&mut sim)?;
        let report = sim.report();

        if self.json {
            let json = serde_json::json!({ "outcome": outcome, "report": report });
            println!("{}", serde_json::to_string_pretty(&json)?);
            return Ok(());
        }

        println!(
            "virtual address {LAB_VIRTUAL_ADDRESS:#x} of pid {LAB_PID} -> physical address {:#x} holds {}\n",
            outcome.physical_address, outcome.value
        );
        print!("{report}");

        Ok(())
    }
}
