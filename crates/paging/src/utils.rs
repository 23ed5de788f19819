//! This module contains utility and helper functions for this crate.

/// Returns a human-readable string describing a size in bytes.
///
/// ## Returns
/// - A human-readable string describing `total` in B, KiB, MiB, GiB, TiB, PiB, or EiB.
pub fn human_bytes(total: u64) -> String {
    const UNIT: u64 = 1024;
    if total < UNIT {
        return format!("{} B", total);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = total / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}iB", (total as f64) / (div as f64), ['K', 'M', 'G', 'T', 'P', 'E'][exp])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn units() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(1023), "1023 B");
        assert_eq!(human_bytes(4096), "4.0 KiB");
        assert_eq!(human_bytes(128 << 20), "128.0 MiB");
        assert_eq!(human_bytes(1 << 39), "512.0 GiB");
        assert_eq!(human_bytes(u64::MAX), "16.0 EiB");
    }
}
