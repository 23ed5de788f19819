//! Subcommands for the `pagewise` binary

use anyhow::Result;
use clap::Subcommand;

mod addresses;
mod decompose;
mod paging;
mod stack;

pub(crate) trait PagewiseSubcommandDispatcher {
    /// Dispatches the subcommand
    fn dispatch(self) -> Result<()>;
}

/// The subcommands for the `pagewise` binary
#[derive(Subcommand, Debug)]
pub(crate) enum PagewiseSubcommand {
    /// Print where globals, code, the stack and the heap live in this process
    Addresses(addresses::AddressesArgs),
    /// Measure how far the stack pointer moves under recursion
    Stack(stack::StackArgs),
    /// Split addresses into page number and page offset
    Decompose(decompose::DecomposeArgs),
    /// Run the four-level paging worked example in a simulated machine
    Paging(paging::PagingArgs),
}

impl PagewiseSubcommandDispatcher for PagewiseSubcommand {
    fn dispatch(self) -> Result<()> {
        match self {
            PagewiseSubcommand::Addresses(args) => args.dispatch(),
            PagewiseSubcommand::Stack(args) => args.dispatch(),
            PagewiseSubcommand::Decompose(args) => args.dispatch(),
            PagewiseSubcommand::Paging(args) => args.dispatch(),
        }
    }
}
