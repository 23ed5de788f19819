//! The `decompose` subcommand for the pagewise binary

use super::PagewiseSubcommandDispatcher;
use anyhow::Result;
use clap::Args;
use pagewise_addr::{
    decompose, format_address,
    utils::{parse_address, ser::hex_u64},
    Address, DecomposedAddress, PageGeometry,
};
use pagewise_host::host_geometry;
use serde::Serialize;

/// Command line arguments for `pagewise decompose`
#[derive(Args, Debug)]
#[command(author, version, about)]
pub(crate) struct DecomposeArgs {
    /// The addresses to decompose, in decimal or `0x`-prefixed hexadecimal.
    #[arg(required = true, value_parser = parse_address)]
    addresses: Vec<Address>,

    /// The page size in bytes. Must be a power of two. Defaults to the host's page size.
    #[arg(long, short)]
    page_size: Option<u64>,

    /// Print the decompositions as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Decomposition {
    #[serde(with = "hex_u64")]
    address: Address,
    #[serde(flatten)]
    decomposed: DecomposedAddress,
}

impl PagewiseSubcommandDispatcher for DecomposeArgs {
    fn dispatch(self) -> Result<()> {
        let geometry = match self.page_size {
            Some(page_size) => PageGeometry::try_from_page_size(page_size)?,
            None => *host_geometry()?,
        };
        tracing::info!(target: "pagewise-cli::decompose", "Decomposing with {} byte pages", geometry.page_bytes);

        let decompositions = self
            .addresses
            .into_iter()
            .map(|address| Decomposition { address, decomposed: decompose(address, &geometry) })
            .collect::<Vec<_>>();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&decompositions)?);
            return Ok(());
        }

        for Decomposition { address, decomposed } in decompositions {
            println!("{}", format_address(address, &decomposed));
        }

        Ok(())
    }
}
