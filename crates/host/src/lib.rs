//! Probes of the host process: its page size, where its globals, code, stack and heap live,
//! and how far its stack pointer moves under recursion.

use pagewise_addr::Address;

mod page_size;
pub use page_size::{host_geometry, page_size};

mod samples;
pub use samples::{sample_addresses, AddressSample, Region};

mod stack;
pub use stack::{
    default_schedule, ensure_fits_stack, measure_stack_growth, run_on_stack, GrowthDirection,
    StackSample,
};

/// Widen the location of `value` to an [Address].
#[inline(always)]
pub(crate) fn address_of<T: ?Sized>(value: &T) -> Address {
    value as *const T as *const () as usize as Address
}
