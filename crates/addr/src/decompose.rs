//! Decomposition of an [Address] into a page number and an intra-page offset.

use crate::{utils::ser::hex_u64, Address, PageGeometry};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A [DecomposedAddress] is a read-only view of an [Address] under a [PageGeometry].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecomposedAddress {
    /// The index of the page containing the address.
    #[serde(with = "hex_u64")]
    pub page_number: u64,
    /// The position of the address within its page, in `[0, page_bytes)`.
    pub offset: u64,
    /// The size of the page in bytes.
    pub page_bytes: u64,
}

impl DecomposedAddress {
    /// Reassemble the [Address] this view was taken from.
    #[inline(always)]
    pub const fn recompose(&self) -> Address {
        self.page_number * self.page_bytes + self.offset
    }
}

impl Display for DecomposedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} * {} + {} = {}",
            self.page_number,
            self.page_bytes,
            self.offset,
            self.recompose()
        )
    }
}

/// Split an [Address] into its page number and page offset.
///
/// The page number is a logical right shift of the address, so the result is the same for
/// every `u64` regardless of its top bit.
///
/// ### Takes
/// - `address`: The address to decompose.
/// - `geometry`: The page geometry to decompose the address under.
///
/// ### Returns
/// - The [DecomposedAddress].
#[inline(always)]
pub const fn decompose(address: Address, geometry: &PageGeometry) -> DecomposedAddress {
    DecomposedAddress {
        page_number: address >> geometry.offset_bits,
        offset: address & geometry.offset_mask,
        page_bytes: geometry.page_bytes,
    }
}

/// Render an [Address] and its decomposition as two lines of text: the address in
/// hexadecimal, then the decomposition as `page_number * page_bytes + offset = address` in
/// decimal.
pub fn format_address(address: Address, decomposed: &DecomposedAddress) -> String {
    format!(
        "hexadecimal: {address:#x}\ndecimal: {} * {} + {} = {address}\n",
        decomposed.page_number, decomposed.page_bytes, decomposed.offset
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compute_page_geometry;
    use proptest::{prelude::any, prop_assert, prop_assert_eq, proptest};

    mod scenarios {
        use super::*;

        #[test]
        fn four_kib_page() {
            let geometry = compute_page_geometry(4096);
            let decomposed = decompose(0x1000_1234, &geometry);
            assert_eq!(decomposed.page_number, 0x10001);
            assert_eq!(decomposed.offset, 0x234);
            assert_eq!(decomposed.recompose(), 0x1000_1234);
        }

        #[test]
        fn single_byte_pages() {
            let geometry = compute_page_geometry(1);
            for address in [0, 1, 0xdead_beef, u64::MAX] {
                let decomposed = decompose(address, &geometry);
                assert_eq!(decomposed.offset, 0);
                assert_eq!(decomposed.page_number, address);
            }
        }

        #[test]
        fn page_boundary() {
            let geometry = compute_page_geometry(1 << 16);
            let decomposed = decompose(7 << 16, &geometry);
            assert_eq!(decomposed.offset, 0);
            assert_eq!(decomposed.page_number, 7);
        }

        #[test]
        fn top_bit_set() {
            let geometry = compute_page_geometry(4096);
            let decomposed = decompose(0xffff_8000_0000_0123, &geometry);
            assert_eq!(decomposed.page_number, 0x000f_fff8_0000_0000);
            assert_eq!(decomposed.offset, 0x123);
            assert_eq!(decomposed.recompose(), 0xffff_8000_0000_0123);
        }
    }

    mod formatting {
        use super::*;

        #[test]
        fn two_lines() {
            let geometry = compute_page_geometry(4096);
            let decomposed = decompose(0x1000_1234, &geometry);
            assert_eq!(
                format_address(0x1000_1234, &decomposed),
                "hexadecimal: 0x10001234\ndecimal: 65537 * 4096 + 564 = 268440116\n"
            );
        }

        #[test]
        fn display_equation() {
            let geometry = compute_page_geometry(16);
            let decomposed = decompose(35, &geometry);
            assert_eq!(decomposed.to_string(), "2 * 16 + 3 = 35");
        }

        #[test]
        fn serialize_hex_page_number() {
            let geometry = compute_page_geometry(4096);
            let json = serde_json::to_string(&decompose(0x1000_1234, &geometry)).unwrap();
            assert_eq!(json, r#"{"pageNumber":"0x10001","offset":564,"pageBytes":4096}"#);
            let back: DecomposedAddress = serde_json::from_str(&json).unwrap();
            assert_eq!(back.recompose(), 0x1000_1234);
        }
    }

    proptest! {
        #[test]
        fn offset_within_page(k in 0u32..=30, address in any::<u64>()) {
            let geometry = compute_page_geometry(1 << k);
            prop_assert!(decompose(address, &geometry).offset < geometry.page_bytes);
        }

        #[test]
        fn recomposes(k in 0u32..=30, address in any::<u64>()) {
            let geometry = compute_page_geometry(1 << k);
            let decomposed = decompose(address, &geometry);
            prop_assert_eq!(
                decomposed.page_number * geometry.page_bytes + decomposed.offset,
                address
            );
        }

        #[test]
        fn idempotent(k in 0u32..=30, address in any::<u64>()) {
            let geometry = compute_page_geometry(1 << k);
            prop_assert_eq!(decompose(address, &geometry), decompose(address, &geometry));
        }
    }
}
