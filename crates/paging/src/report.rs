//! Contains the [MemoryReport] summarising a [PagingSimulation]'s memory use.
//!
//! [PagingSimulation]: crate::PagingSimulation

use crate::{utils::human_bytes, PhysAddr, Pid};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A snapshot of the memory used by a [PagingSimulation].
///
/// [PagingSimulation]: crate::PagingSimulation
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryReport {
    /// The number of frames allocated, page tables included.
    pub frames_used: u64,
    /// The size of a frame in bytes.
    pub frame_bytes: u64,
    /// The size of simulated physical memory in bytes.
    pub memory_bytes: u64,
    /// The physical address of each process's root page table, ordered by pid.
    pub page_tables: Vec<(Pid, PhysAddr)>,
    /// The number of cached translations.
    pub tlb_entries: usize,
    /// The maximum number of cached translations.
    pub tlb_capacity: usize,
    /// The number of TLB lookups that hit.
    pub tlb_hits: u64,
    /// The number of TLB lookups that missed.
    pub tlb_misses: u64,
    /// The size of a single-level page table covering the whole virtual address space.
    pub flat_table_bytes: u64,
}

impl MemoryReport {
    /// Returns the number of bytes covered by allocated frames.
    pub fn bytes_used(&self) -> u64 {
        self.frames_used * self.frame_bytes
    }
}

impl Display for MemoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== MEMORY STATE ===")?;
        writeln!(f, "Total frames used: {}", self.frames_used)?;
        writeln!(
            f,
            "Total memory used by frames: {} bytes ({} of {})",
            self.bytes_used(),
            human_bytes(self.bytes_used()),
            human_bytes(self.memory_bytes)
        )?;

        writeln!(f, "\n=== PAGE TABLES ===")?;
        for (pid, root) in &self.page_tables {
            writeln!(f, "Process {pid} -> root page table @ physical address {root:#x}")?;
        }

        writeln!(f, "\n=== TLB ===")?;
        writeln!(
            f,
            "{} of {} entries used, {} hits, {} misses",
            self.tlb_entries, self.tlb_capacity, self.tlb_hits, self.tlb_misses
        )?;

        writeln!(f, "\nSingle-level page table size: {}", human_bytes(self.flat_table_bytes))
    }
}
