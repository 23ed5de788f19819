//! Queries the page size of the host and derives its [PageGeometry] once per process.

use anyhow::Result;
use once_cell::sync::OnceCell;
use pagewise_addr::{compute_page_geometry, PageGeometry};

/// The geometry of the host's pages, computed on first use and read-only afterwards.
pub(crate) static HOST_GEOMETRY: OnceCell<PageGeometry> = OnceCell::new();

/// Returns the page size of the host in bytes, as reported by `sysconf(_SC_PAGESIZE)`.
#[cfg(unix)]
pub fn page_size() -> Result<u64> {
    // SAFETY: `sysconf` only reads a configuration value.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    anyhow::ensure!(size > 0, "Host reported an invalid page size: {size}");
    Ok(size as u64)
}

/// Returns the page size of the host in bytes. Hosts without `sysconf` are assumed to use
/// 4 KiB pages.
#[cfg(not(unix))]
pub fn page_size() -> Result<u64> {
    const FALLBACK_PAGE_SIZE: u64 = 4096;
    tracing::warn!(target: "pagewise::host", "No page size query on this host, assuming {FALLBACK_PAGE_SIZE} bytes");
    Ok(FALLBACK_PAGE_SIZE)
}

/// Returns the [PageGeometry] of the host. The page size is queried on the first call only.
pub fn host_geometry() -> Result<&'static PageGeometry> {
    HOST_GEOMETRY.get_or_try_init(|| {
        let size = page_size()?;
        let geometry = compute_page_geometry(size);
        if geometry.page_bytes != size {
            tracing::warn!(
                target: "pagewise::host",
                "Host page size {size} is not a power of two, decomposing with {} byte pages",
                geometry.page_bytes
            );
        }
        tracing::debug!(
            target: "pagewise::host",
            "Host page size is {size} bytes ({} offset bits)",
            geometry.offset_bits
        );
        Ok(geometry)
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn power_of_two() {
        let size = page_size().unwrap();
        assert!(size.is_power_of_two());
        assert_eq!(host_geometry().unwrap().page_bytes, size);
    }

    #[test]
    fn computed_once() {
        let first = host_geometry().unwrap() as *const PageGeometry;
        let second = host_geometry().unwrap() as *const PageGeometry;
        assert_eq!(first, second);
    }
}
