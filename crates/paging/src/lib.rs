//! A simulation of x86-64 style multi-level paging.
//!
//! Physical memory is a flat byte array carved into frames by a bump allocator. Every process
//! owns a root page table, and each table holds [ENTRIES_PER_TABLE] little-endian entries of
//! [ENTRY_BYTES] bytes. An entry holds the physical address of the next table (or, at the
//! last level, of the mapped frame); `0` marks an empty entry, which is why frame `0` is never
//! handed out.
//!
//! ```text
//! 48 bit virtual address, 4 KiB pages (4 levels)
//! ┌─────────┬─────────┬─────────┬─────────┬──────────────┐
//! │ 9 bits  │ 9 bits  │ 9 bits  │ 9 bits  │ 12 bit offset│
//! └─────────┴─────────┴─────────┴─────────┴──────────────┘
//!     CR3 ──► L1 ──────► L2 ──────► L3 ──────► L4 ──► frame
//! ```
//!
//! 2 MiB pages (21 offset bits) use three levels and 1 GiB pages (30 offset bits) use two.

/// A process identifier.
pub type Pid = u64;

/// An address within simulated physical memory.
pub type PhysAddr = u64;

/// The width of a virtual address in bits.
pub const ADDRESS_BITS: u32 = 48;

/// The number of page number bits consumed by each level of page table.
pub const LEVEL_BITS: u32 = 9;

/// The number of entries in a page table (all levels).
pub const ENTRIES_PER_TABLE: u64 = 1 << LEVEL_BITS;

/// The size of a page table entry in bytes.
pub const ENTRY_BYTES: u64 = 8;

/// The size of a page table in bytes.
pub const TABLE_BYTES: u64 = ENTRIES_PER_TABLE * ENTRY_BYTES;

/// The value of an empty page table entry.
pub const NULL: PhysAddr = 0;

mod memory;
pub use memory::PhysicalMemory;

mod table;
pub use table::{page_number_from_indices, table_indices};

mod tlb;
pub use tlb::Tlb;

mod simulation;
pub use simulation::{PagingSimulation, PagingSimulationBuilder};

mod report;
pub use report::MemoryReport;

pub mod lab;

pub mod utils;
