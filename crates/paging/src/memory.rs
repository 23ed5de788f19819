//! Contains [PhysicalMemory], the simulated RAM that page tables and frames live in.

use crate::{PhysAddr, NULL};
use anyhow::{ensure, Result};

/// [PhysicalMemory] is a zero-initialised byte array split into equally sized frames.
///
/// Frames are handed out by a bump allocator and never freed, so a freshly allocated frame is
/// always zeroed. Frame `0` is reserved so that a physical address of `0` can mark an empty
/// page table entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PhysicalMemory {
    /// The raw bytes of memory.
    bytes: Vec<u8>,
    /// The size of a frame in bytes.
    frame_bytes: u64,
    /// The number of frames handed out so far.
    frames_used: u64,
}

impl PhysicalMemory {
    /// Create a new [PhysicalMemory] of `size` bytes split into frames of `frame_bytes` bytes.
    pub fn new(size: usize, frame_bytes: u64) -> Self {
        Self { bytes: vec![0; size], frame_bytes, frames_used: 0 }
    }

    /// Returns the size of memory in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Returns the size of a frame in bytes.
    pub fn frame_bytes(&self) -> u64 {
        self.frame_bytes
    }

    /// Returns the number of frames allocated so far.
    pub fn frames_used(&self) -> u64 {
        self.frames_used
    }

    /// Allocate the next free frame.
    ///
    /// ### Returns
    /// - `Ok(address)` with the physical address of the first byte of the frame.
    /// - `Err(_)` if memory has no room for another frame.
    pub fn alloc_frame(&mut self) -> Result<PhysAddr> {
        let base = (self.frames_used + 1) * self.frame_bytes;
        ensure!(
            base + self.frame_bytes <= self.size(),
            "Out of physical memory: {} frames of {} bytes in use",
            self.frames_used,
            self.frame_bytes
        );

        self.frames_used += 1;
        tracing::trace!(target: "pagewise::paging", "Allocated frame {} @ {base:#x}", self.frames_used);
        Ok(base)
    }

    /// Read a little-endian 64-bit value from `address..address + 8`.
    pub fn read_u64(&self, address: PhysAddr) -> Result<u64> {
        let start = self.check_range(address)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.bytes[start..start + 8]);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Write a little-endian 64-bit value to `address..address + 8`.
    pub fn write_u64(&mut self, address: PhysAddr, value: u64) -> Result<()> {
        let start = self.check_range(address)?;
        self.bytes[start..start + 8].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn check_range(&self, address: PhysAddr) -> Result<usize> {
        ensure!(address != NULL, "Access to the NULL frame");
        ensure!(
            address.checked_add(8).is_some_and(|end| end <= self.size()),
            "Physical address {address:#x} is out of bounds"
        );
        Ok(address as usize)
    }
}
