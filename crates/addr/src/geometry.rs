//! This module contains the [PageGeometry] type, which describes how an [Address] is split
//! into a page number and a page offset.
//!
//! [Address]: crate::Address

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// The [PageGeometry] describes the low-order bits of an [Address] that index into a single
/// page.
///
/// [Address]: crate::Address
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    /// The number of low-order bits spanning one page.
    pub offset_bits: u32,
    /// The size of a page in bytes, `2^offset_bits`.
    pub page_bytes: u64,
    /// The mask to apply to an address to obtain the offset within its page.
    pub offset_mask: u64,
}

impl PageGeometry {
    /// Create a [PageGeometry] from a page size in bytes.
    ///
    /// The offset bit count is found by halving `page_size - 1` until it reaches zero. This is
    /// exact for powers of two. Any other size silently produces the geometry of the next
    /// power of two above it, and a size of `0` produces a single byte page.
    pub const fn from_page_size(page_size: u64) -> Self {
        let mut remaining = page_size.saturating_sub(1);
        let mut offset_bits = 0;
        while remaining != 0 {
            remaining /= 2;
            offset_bits += 1;
        }

        // Sizes above 2^63 cannot be represented as a page within a 64 bit address.
        if offset_bits >= u64::BITS {
            offset_bits = u64::BITS - 1;
        }

        let page_bytes = 1u64 << offset_bits;
        Self { offset_bits, page_bytes, offset_mask: page_bytes - 1 }
    }

    /// Create a [PageGeometry] from a page size in bytes, rejecting sizes that are zero or
    /// not a power of two.
    ///
    /// ### Takes
    /// - `page_size`: The page size in bytes.
    ///
    /// ### Returns
    /// - `Ok(geometry)` if the page size is a power of two.
    /// - `Err(_)` otherwise.
    pub fn try_from_page_size(page_size: u64) -> Result<Self> {
        ensure!(page_size.is_power_of_two(), "Invalid page size {page_size}: not a power of two");
        Ok(Self::from_page_size(page_size))
    }

    /// Create a [PageGeometry] spanning `offset_bits` low-order bits.
    ///
    /// ### Takes
    /// - `offset_bits`: The number of bits in a page offset. Must be less than 64.
    ///
    /// ### Returns
    /// - `Ok(geometry)` if the page fits within an address.
    /// - `Err(_)` otherwise.
    pub fn from_offset_bits(offset_bits: u32) -> Result<Self> {
        ensure!(offset_bits < u64::BITS, "Invalid offset bit count {offset_bits}");
        Ok(Self::from_page_size(1 << offset_bits))
    }

    /// Returns the number of bits left above the offset within an address of `address_bits`
    /// bits.
    pub const fn page_number_bits(&self, address_bits: u32) -> u32 {
        address_bits.saturating_sub(self.offset_bits)
    }
}

/// Compute the [PageGeometry] for a page size reported by the host. See
/// [PageGeometry::from_page_size] for how malformed sizes are treated.
pub const fn compute_page_geometry(page_size: u64) -> PageGeometry {
    PageGeometry::from_page_size(page_size)
}
