//! Splitting page numbers into per-level page table indices and back.

use crate::{ENTRIES_PER_TABLE, LEVEL_BITS};

/// Split a page number into one table index per level, most significant level first.
///
/// ### Takes
/// - `page_number`: The page number to split.
/// - `levels`: The number of page table levels.
///
/// ### Returns
/// - The `levels` indices, each in `[0, ENTRIES_PER_TABLE)`.
pub fn table_indices(page_number: u64, levels: u32) -> Vec<u64> {
    (0..levels)
        .rev()
        .map(|level| (page_number >> (LEVEL_BITS * level)) & (ENTRIES_PER_TABLE - 1))
        .collect()
}

/// Compose a page number from per-level table indices, most significant level first.
pub const fn page_number_from_indices(indices: &[u64]) -> u64 {
    let mut page_number = 0;
    let mut i = 0;
    while i < indices.len() {
        page_number = (page_number << LEVEL_BITS) | (indices[i] & (ENTRIES_PER_TABLE - 1));
        i += 1;
    }
    page_number
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::{prelude::any, prop_assert_eq, proptest};

    #[test]
    fn four_levels() {
        let page_number = (123 << 27) + (456 << 18) + (379 << 9) + 457;
        assert_eq!(page_number, 16_628_512_713);
        assert_eq!(table_indices(page_number, 4), [123, 456, 379, 457]);
        assert_eq!(page_number_from_indices(&[123, 456, 379, 457]), page_number);
        assert_eq!((page_number << 12) + 789, 0x3df2_2f7c_9315);
    }

    #[test]
    fn fewer_levels() {
        assert_eq!(table_indices(0x3_ffff, 2), [511, 511]);
        assert_eq!(table_indices(1 << 18, 2), [0, 0]);
        assert_eq!(page_number_from_indices(&[]), 0);
    }

    proptest! {
        #[test]
        fn split_then_compose(page_number in any::<u64>()) {
            let page_number = page_number & ((1 << 36) - 1);
            prop_assert_eq!(page_number_from_indices(&table_indices(page_number, 4)), page_number);
        }
    }
}
