//! The `addresses` subcommand for the pagewise binary

use super::PagewiseSubcommandDispatcher;
use anyhow::Result;
use clap::Args;
use pagewise_addr::{decompose, format_address, DecomposedAddress, PageGeometry};
use pagewise_host::{host_geometry, sample_addresses, AddressSample, Region};
use serde::Serialize;

/// Command line arguments for `pagewise addresses`
#[derive(Args, Debug)]
#[command(author, version, about)]
pub(crate) struct AddressesArgs {
    /// Print the samples as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressReport<'a> {
    geometry: &'a PageGeometry,
    samples: Vec<DecomposedSample>,
}

#[derive(Serialize)]
struct DecomposedSample {
    #[serde(flatten)]
    sample: AddressSample,
    decomposed: DecomposedAddress,
}

impl PagewiseSubcommandDispatcher for AddressesArgs {
    fn dispatch(self) -> Result<()> {
        let geometry = host_geometry()?;
        let samples = sample_addresses();
        tracing::info!(target: "pagewise-cli::addresses", "Took {} address samples", samples.len());

        if self.json {
            let samples = samples
                .into_iter()
                .map(|sample| {
                    let decomposed = decompose(sample.address, geometry);
                    DecomposedSample { sample, decomposed }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&AddressReport { geometry, samples })?);
            return Ok(());
        }

        println!();
        println!("this system uses {} offset bits in each virtual address", geometry.offset_bits);
        println!(
            "that means the page size is 2^{} = {} bytes\n",
            geometry.offset_bits, geometry.page_bytes
        );
        println!("---------\n");

        let mut previous = None;
        for sample in samples {
            // Heap samples follow a separator, as they come from a separate allocation.
            if sample.region == Region::Heap && previous != Some(Region::Heap) {
                println!("---------\n");
            }
            tracing::debug!(target: "pagewise-cli::addresses", "Sampled {} region @ {:#x}", sample.region, sample.address);
            println!("virtual address pointing to 1st byte of {}:", sample.label);
            println!("{}", format_address(sample.address, &decompose(sample.address, geometry)));
            previous = Some(sample.region);
        }
        println!("---------\n");

        Ok(())
    }
}
