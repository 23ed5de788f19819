//! Contains the [PagingSimulation] and its [PagingSimulationBuilder].

use crate::{
    table::table_indices, tlb::DEFAULT_TLB_CAPACITY, MemoryReport, PhysAddr, PhysicalMemory, Pid,
    Tlb, ADDRESS_BITS, ENTRY_BYTES, LEVEL_BITS, NULL, TABLE_BYTES,
};
use anyhow::{bail, ensure, Result};
use pagewise_addr::{decompose, Address, DecomposedAddress, PageGeometry};
use rustc_hash::FxHashMap;

/// The [PagingSimulation] translates 48 bit virtual addresses through per-process page tables
/// held in [PhysicalMemory], caching translations in a [Tlb].
#[derive(Clone, Debug)]
pub struct PagingSimulation {
    /// The simulated RAM.
    pub(crate) memory: PhysicalMemory,
    /// The split of a virtual address into page number and offset.
    pub(crate) geometry: PageGeometry,
    /// The number of page table levels between CR3 and a frame.
    pub(crate) levels: u32,
    /// The physical address of the current process's root page table.
    pub(crate) cr3: PhysAddr,
    /// The process whose address space is active.
    pub(crate) current_pid: Pid,
    /// Map of process ids to the physical address of their root page table.
    pub(crate) page_tables: FxHashMap<Pid, PhysAddr>,
    /// Cached translations of the current process.
    pub(crate) tlb: Tlb,
}

impl PagingSimulation {
    /// Returns a [PagingSimulationBuilder] with the default configuration.
    pub fn builder() -> PagingSimulationBuilder {
        PagingSimulationBuilder::default()
    }

    /// Returns the page geometry of the simulation.
    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Returns the number of page table levels.
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Returns the process whose address space is active.
    pub fn current_pid(&self) -> Pid {
        self.current_pid
    }

    /// Returns the physical address of the active root page table.
    pub fn cr3(&self) -> PhysAddr {
        self.cr3
    }

    /// Returns the [Tlb].
    pub fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    /// Returns the simulated [PhysicalMemory].
    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    /// Split a page number into the table index used at each level, most significant first.
    pub fn table_indices(&self, page_number: u64) -> Vec<u64> {
        table_indices(page_number, self.levels)
    }

    /// Switch to the address space of `pid`, creating an empty root page table for it if it
    /// has never run before. The [Tlb] is flushed on every switch.
    ///
    /// ### Takes
    /// - `pid`: The process to switch to.
    ///
    /// ### Returns
    /// - `Ok(())` if the switch was successful.
    /// - `Err(_)` if a root page table could not be allocated.
    pub fn context_switch(&mut self, pid: Pid) -> Result<()> {
        if self.current_pid == pid {
            tracing::warn!(target: "pagewise::paging", "Already running pid {pid}");
            return Ok(());
        }

        let root = match self.page_tables.get(&pid) {
            Some(root) => *root,
            None => {
                let root = self.memory.alloc_frame()?;
                self.page_tables.insert(pid, root);
                tracing::debug!(target: "pagewise::paging", "Created root page table for pid {pid} @ {root:#x}");
                root
            }
        };

        self.current_pid = pid;
        self.cr3 = root;
        self.tlb.flush();
        Ok(())
    }

    /// Map `page_number` in the current address space to a newly allocated frame, creating
    /// any missing intermediate page tables on the way down.
    ///
    /// ### Takes
    /// - `page_number`: The virtual page to map.
    ///
    /// ### Returns
    /// - `Ok(frame)` with the physical address of the new frame.
    /// - `Err(_)` if the page is already mapped, out of range, or memory is exhausted.
    pub fn add_entry(&mut self, page_number: u64) -> Result<PhysAddr> {
        self.check_page_number(page_number)?;

        let indices = self.table_indices(page_number);
        let Some((last, upper)) = indices.split_last() else {
            bail!("Page tables have no levels");
        };

        let mut table = self.cr3;
        for index in upper {
            let entry = table + index * ENTRY_BYTES;
            let mut next = self.memory.read_u64(entry)?;
            if next == NULL {
                next = self.memory.alloc_frame()?;
                self.memory.write_u64(entry, next)?;
                tracing::trace!(target: "pagewise::paging", "Linked page table @ {next:#x} into entry {index} of {table:#x}");
            }
            table = next;
        }

        let entry = table + last * ENTRY_BYTES;
        ensure!(
            self.memory.read_u64(entry)? == NULL,
            "Page {page_number:#x} is already mapped in pid {}",
            self.current_pid
        );

        let frame = self.memory.alloc_frame()?;
        self.memory.write_u64(entry, frame)?;
        tracing::debug!(target: "pagewise::paging", "Mapped page {page_number:#x} of pid {} to frame @ {frame:#x}", self.current_pid);
        Ok(frame)
    }

    /// Translate a virtual address of the current process into a physical address, consulting
    /// the [Tlb] before walking the page tables.
    ///
    /// ### Takes
    /// - `virtual_address`: The address to translate.
    ///
    /// ### Returns
    /// - `Ok(physical_address)` if the page containing the address is mapped.
    /// - `Err(_)` on a page fault.
    pub fn translate(&mut self, virtual_address: Address) -> Result<PhysAddr> {
        let DecomposedAddress { page_number, offset, .. } = self.decompose(virtual_address)?;

        if let Some(frame) = self.tlb.lookup(self.current_pid, page_number) {
            return Ok(frame + offset);
        }

        let frame = self.walk(page_number)?;
        self.tlb.insert(self.current_pid, page_number, frame);
        Ok(frame + offset)
    }

    /// Write a little-endian 64-bit value to a virtual address of the current process.
    pub fn write_u64(&mut self, virtual_address: Address, value: u64) -> Result<()> {
        let physical_address = self.translate_u64(virtual_address)?;
        self.memory.write_u64(physical_address, value)
    }

    /// Read a little-endian 64-bit value from a virtual address of the current process.
    pub fn read_u64(&mut self, virtual_address: Address) -> Result<u64> {
        let physical_address = self.translate_u64(virtual_address)?;
        self.memory.read_u64(physical_address)
    }

    /// Summarise the memory used by the simulation.
    pub fn report(&self) -> MemoryReport {
        let mut page_tables =
            self.page_tables.iter().map(|(pid, root)| (*pid, *root)).collect::<Vec<_>>();
        page_tables.sort_unstable();

        let flat_entries = 1u128 << self.geometry.page_number_bits(ADDRESS_BITS);
        MemoryReport {
            frames_used: self.memory.frames_used(),
            frame_bytes: self.memory.frame_bytes(),
            memory_bytes: self.memory.size(),
            page_tables,
            tlb_entries: self.tlb.len(),
            tlb_capacity: self.tlb.capacity(),
            tlb_hits: self.tlb.hits(),
            tlb_misses: self.tlb.misses(),
            flat_table_bytes: u64::try_from(flat_entries * ENTRY_BYTES as u128).unwrap_or(u64::MAX),
        }
    }

    /// Walk the page tables of the current process down to the frame mapping `page_number`.
    fn walk(&self, page_number: u64) -> Result<PhysAddr> {
        let mut table = self.cr3;
        for index in self.table_indices(page_number) {
            table = self.memory.read_u64(table + index * ENTRY_BYTES)?;
            if table == NULL {
                bail!("Page fault: page {page_number:#x} is not mapped in pid {}", self.current_pid);
            }
        }
        Ok(table)
    }

    /// Translate the first byte of an 8 byte access, which must not straddle two pages.
    fn translate_u64(&mut self, virtual_address: Address) -> Result<PhysAddr> {
        let DecomposedAddress { offset, page_bytes, .. } = self.decompose(virtual_address)?;
        ensure!(
            offset + ENTRY_BYTES <= page_bytes,
            "Access at {virtual_address:#x} crosses a page boundary"
        );
        self.translate(virtual_address)
    }

    fn decompose(&self, virtual_address: Address) -> Result<DecomposedAddress> {
        ensure!(
            virtual_address >> ADDRESS_BITS == 0,
            "Virtual address {virtual_address:#x} is wider than {ADDRESS_BITS} bits"
        );
        Ok(decompose(virtual_address, &self.geometry))
    }

    fn check_page_number(&self, page_number: u64) -> Result<()> {
        let bits = self.geometry.page_number_bits(ADDRESS_BITS);
        ensure!(page_number >> bits == 0, "Page number {page_number:#x} is wider than {bits} bits");
        Ok(())
    }
}

/// The [PagingSimulationBuilder] is a helper for building a [PagingSimulation].
#[derive(Debug, Clone)]
pub struct PagingSimulationBuilder {
    /// The size of simulated physical memory in bytes.
    ram_bytes: usize,
    /// The number of offset bits in a virtual address.
    offset_bits: u32,
    /// The number of translations the [Tlb] holds.
    tlb_capacity: usize,
}

impl Default for PagingSimulationBuilder {
    fn default() -> Self {
        Self { ram_bytes: 128 << 20, offset_bits: 12, tlb_capacity: DEFAULT_TLB_CAPACITY }
    }
}

impl PagingSimulationBuilder {
    /// Builds the [PagingSimulation] with pid `0` active.
    ///
    /// ### Returns
    /// - `Ok(simulation)` if the configuration is consistent.
    /// - `Err(_)` if the page size cannot be split into whole page table levels, a page table
    ///   would not fit in a frame, or memory cannot hold three frames: the reserved NULL frame,
    ///   a root table and one data frame.
    pub fn build(self) -> Result<PagingSimulation> {
        let geometry = PageGeometry::from_offset_bits(self.offset_bits)?;
        ensure!(
            self.offset_bits < ADDRESS_BITS,
            "{} offset bits leave no room for a page number",
            self.offset_bits
        );

        let page_number_bits = geometry.page_number_bits(ADDRESS_BITS);
        ensure!(
            page_number_bits % LEVEL_BITS == 0,
            "{page_number_bits} page number bits cannot be split into {LEVEL_BITS} bit levels"
        );
        ensure!(
            geometry.page_bytes >= TABLE_BYTES,
            "{} byte pages cannot hold a {TABLE_BYTES} byte page table",
            geometry.page_bytes
        );
        ensure!(
            self.ram_bytes as u64 >= 3 * geometry.page_bytes,
            "{} bytes of memory cannot hold the NULL frame, a root table and a frame",
            self.ram_bytes
        );
        ensure!(self.tlb_capacity > 0, "The TLB needs room for at least one translation");

        let mut memory = PhysicalMemory::new(self.ram_bytes, geometry.page_bytes);
        let root = memory.alloc_frame()?;

        let mut page_tables = FxHashMap::default();
        page_tables.insert(0, root);

        tracing::info!(
            target: "pagewise::paging",
            "Simulating {} bytes of memory with {} byte pages and {} levels",
            self.ram_bytes,
            geometry.page_bytes,
            page_number_bits / LEVEL_BITS
        );

        Ok(PagingSimulation {
            memory,
            geometry,
            levels: page_number_bits / LEVEL_BITS,
            cr3: root,
            current_pid: 0,
            page_tables,
            tlb: Tlb::new(self.tlb_capacity),
        })
    }

    pub fn with_ram_bytes(mut self, ram_bytes: usize) -> Self {
        self.ram_bytes = ram_bytes;
        self
    }

    pub fn with_offset_bits(mut self, offset_bits: u32) -> Self {
        self.offset_bits = offset_bits;
        self
    }

    pub fn with_tlb_capacity(mut self, tlb_capacity: usize) -> Self {
        self.tlb_capacity = tlb_capacity;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn small_simulation() -> PagingSimulation {
        PagingSimulation::builder().with_ram_bytes(1 << 20).build().unwrap()
    }

    mod build {
        use super::*;

        #[test]
        fn level_counts() {
            let levels = |offset_bits, ram_bytes| {
                PagingSimulation::builder()
                    .with_offset_bits(offset_bits)
                    .with_ram_bytes(ram_bytes)
                    .build()
                    .map(|sim| sim.levels())
            };
            assert_eq!(levels(12, 1 << 20).unwrap(), 4);
            assert_eq!(levels(21, 8 << 20).unwrap(), 3);
            assert!(levels(13, 1 << 20).is_err());
            assert!(levels(3, 1 << 20).is_err());
            assert!(levels(21, 4 << 20).is_err());
        }

        #[test]
        fn starts_in_pid_zero() {
            let sim = small_simulation();
            assert_eq!(sim.current_pid(), 0);
            assert_eq!(sim.cr3(), 4096);
            assert_eq!(sim.memory().frames_used(), 1);
        }

        #[test]
        fn needs_three_frames() {
            let build = |ram_bytes| PagingSimulation::builder().with_ram_bytes(ram_bytes).build();
            assert!(build(2 * 4096).is_err());
            assert!(build(3 * 4096 - 1).is_err());

            let sim = build(3 * 4096).unwrap();
            assert_eq!(sim.cr3(), 4096);
            assert_eq!(sim.memory().size(), 3 * 4096);
        }

        #[test]
        fn empty_tlb_rejected() {
            assert!(PagingSimulation::builder().with_tlb_capacity(0).build().is_err());
        }
    }

    mod mapping {
        use super::*;

        #[test]
        fn allocates_each_missing_level() {
            let mut sim = small_simulation();
            let frame = sim.add_entry(0x1234).unwrap();
            // Root + three intermediate tables + the frame.
            assert_eq!(sim.memory().frames_used(), 5);
            assert_eq!(frame, 5 * 4096);

            // Neighbouring page shares every table.
            let neighbour = sim.add_entry(0x1235).unwrap();
            assert_eq!(neighbour, 6 * 4096);
            assert_eq!(sim.memory().frames_used(), 6);
        }

        #[test]
        fn double_mapping_fails() {
            let mut sim = small_simulation();
            sim.add_entry(42).unwrap();
            assert!(sim.add_entry(42).is_err());
        }

        #[test]
        fn page_number_out_of_range() {
            let mut sim = small_simulation();
            assert!(sim.add_entry(1 << 36).is_err());
        }

        #[test]
        fn out_of_memory() {
            let mut sim = PagingSimulation::builder().with_ram_bytes(4 * 4096).build().unwrap();
            assert!(sim.add_entry(0).is_err());
        }
    }

    mod translation {
        use super::*;

        #[test]
        fn frame_plus_offset() {
            let mut sim = small_simulation();
            let frame = sim.add_entry(0x7f).unwrap();
            assert_eq!(sim.translate((0x7f << 12) + 0x123).unwrap(), frame + 0x123);
        }

        #[test]
        fn page_fault() {
            let mut sim = small_simulation();
            sim.add_entry(0x7f).unwrap();
            assert!(sim.translate(0x80 << 12).is_err());
            assert!(sim.translate(1 << 48).is_err());
        }

        #[test]
        fn tlb_caches_walks() {
            let mut sim = small_simulation();
            sim.add_entry(3).unwrap();
            sim.translate(3 << 12).unwrap();
            sim.translate((3 << 12) + 8).unwrap();
            assert_eq!((sim.tlb().hits(), sim.tlb().misses()), (1, 1));
            assert_eq!(sim.tlb().len(), 1);
        }

        #[test]
        fn read_write() {
            let mut sim = small_simulation();
            sim.add_entry(9).unwrap();
            sim.write_u64((9 << 12) + 16, 0xdead_beef).unwrap();
            assert_eq!(sim.read_u64((9 << 12) + 16).unwrap(), 0xdead_beef);
            assert_eq!(sim.read_u64((9 << 12) + 24).unwrap(), 0);
        }

        #[test]
        fn straddling_access_fails() {
            let mut sim = small_simulation();
            sim.add_entry(9).unwrap();
            sim.add_entry(10).unwrap();
            assert!(sim.write_u64((10 << 12) - 4, 1).is_err());
            assert!(sim.write_u64((10 << 12) - 8, 1).is_ok());
        }
    }

    mod processes {
        use super::*;

        #[test]
        fn separate_address_spaces() {
            let mut sim = small_simulation();
            sim.add_entry(5).unwrap();
            sim.write_u64(5 << 12, 1).unwrap();

            sim.context_switch(7).unwrap();
            assert!(sim.translate(5 << 12).is_err());
            sim.add_entry(5).unwrap();
            sim.write_u64(5 << 12, 2).unwrap();

            sim.context_switch(0).unwrap();
            assert_eq!(sim.read_u64(5 << 12).unwrap(), 1);
            sim.context_switch(7).unwrap();
            assert_eq!(sim.read_u64(5 << 12).unwrap(), 2);
        }

        #[test]
        fn switch_flushes_tlb() {
            let mut sim = small_simulation();
            sim.add_entry(5).unwrap();
            sim.translate(5 << 12).unwrap();
            assert_eq!(sim.tlb().len(), 1);
            sim.context_switch(1).unwrap();
            assert!(sim.tlb().is_empty());
        }

        #[test]
        fn switch_to_current_is_noop() {
            let mut sim = small_simulation();
            let frames = sim.memory().frames_used();
            sim.context_switch(0).unwrap();
            assert_eq!(sim.memory().frames_used(), frames);
            assert_eq!(sim.cr3(), 4096);
        }
    }
}
