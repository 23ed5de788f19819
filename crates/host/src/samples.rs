//! Sample addresses from each region of the process's address space.

use crate::{address_of, page_size::HOST_GEOMETRY};
use pagewise_addr::{format_address, utils::ser::hex_u64, Address, DecomposedAddress};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, hint::black_box};

/// The [Region] of the address space an [AddressSample] was taken from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Global,
    Code,
    Stack,
    Heap,
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::Global => write!(f, "global"),
            Region::Code => write!(f, "code"),
            Region::Stack => write!(f, "stack"),
            Region::Heap => write!(f, "heap"),
        }
    }
}

/// An [AddressSample] is the address of the first byte of some object in the process.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AddressSample {
    /// What the address points to.
    pub label: String,
    /// The region the object lives in.
    pub region: Region,
    /// The address of the object's first byte.
    #[serde(with = "hex_u64")]
    pub address: Address,
}

impl AddressSample {
    fn new(label: impl Into<String>, region: Region, address: Address) -> Self {
        Self { label: label.into(), region, address }
    }
}

/// Take one [AddressSample] of the host geometry global, one of the `format_address`
/// function, one of a two element array on the stack, and one of each cell of a four element
/// array on the heap.
pub fn sample_addresses() -> Vec<AddressSample> {
    let array_on_stack: [i64; 2] = [12, 23];
    let array_on_heap: Vec<i64> = vec![123; 4];

    let mut samples = vec![
        AddressSample::new("global page geometry", Region::Global, address_of(&HOST_GEOMETRY)),
        AddressSample::new(
            "format_address function",
            Region::Code,
            format_address as fn(Address, &DecomposedAddress) -> String as usize as Address,
        ),
        AddressSample::new("array on stack", Region::Stack, address_of(black_box(&array_on_stack))),
    ];

    samples.extend(array_on_heap.iter().enumerate().map(|(i, cell)| {
        AddressSample::new(format!("array on heap[{i}]"), Region::Heap, address_of(black_box(cell)))
    }));

    samples
}
