//! The worked example of four-level paging: process 123 maps four pages and stores a value
//! at virtual address `0x3df22f7c9315`.

use crate::{page_number_from_indices, PagingSimulation, PhysAddr, Pid};
use anyhow::{ensure, Result};
use pagewise_addr::Address;
use serde::{Deserialize, Serialize};

/// The process the example runs in.
pub const LAB_PID: Pid = 123;

/// The pages mapped by the example, given as their four table indices.
pub const LAB_PAGE_NUMBERS: [u64; 4] = [
    page_number_from_indices(&[1, 2, 3, 4]),
    page_number_from_indices(&[123, 456, 2, 457]),
    page_number_from_indices(&[123, 456, 379, 457]),
    page_number_from_indices(&[123, 456, 379, 500]),
];

/// The address written to: page `[123, 456, 379, 457]`, offset `789`.
pub const LAB_VIRTUAL_ADDRESS: Address = 0x3df2_2f7c_9315;

/// The value written.
pub const LAB_VALUE: u64 = 51;

/// The outcome of [figure_three].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabOutcome {
    /// The physical address [LAB_VIRTUAL_ADDRESS] translated to.
    pub physical_address: PhysAddr,
    /// The value read back through the virtual address.
    pub value: u64,
}

/// Run the worked example against a simulation using 4 KiB pages.
///
/// ### Takes
/// - `sim`: The simulation to run the example in. Pid [LAB_PID] must not have mapped any of
///   [LAB_PAGE_NUMBERS] yet.
///
/// ### Returns
/// - `Ok(outcome)` with the translated address and the value read back.
/// - `Err(_)` if the simulation does not use four levels or a step fails.
pub fn figure_three(sim: &mut PagingSimulation) -> Result<LabOutcome> {
    ensure!(sim.levels() == 4, "The worked example needs four-level paging, not {}", sim.levels());

    sim.context_switch(LAB_PID)?;
    for page_number in LAB_PAGE_NUMBERS {
        sim.add_entry(page_number)?;
    }

    sim.write_u64(LAB_VIRTUAL_ADDRESS, LAB_VALUE)?;
    let physical_address = sim.translate(LAB_VIRTUAL_ADDRESS)?;
    let value = sim.read_u64(LAB_VIRTUAL_ADDRESS)?;
    ensure!(value == LAB_VALUE, "Read back {value} from {LAB_VIRTUAL_ADDRESS:#x}");

    Ok(LabOutcome { physical_address, value })
}
