//! Contains the [Tlb], a fixed capacity cache of page translations with FIFO eviction.

use crate::{PhysAddr, Pid};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// The default number of translations a [Tlb] holds.
pub const DEFAULT_TLB_CAPACITY: usize = 512;

/// A translation lookaside buffer mapping `(pid, page number)` to the physical address of
/// the mapped frame.
#[derive(Clone, Debug)]
pub struct Tlb {
    /// The cached translations.
    entries: FxHashMap<(Pid, u64), PhysAddr>,
    /// Insertion order of the cached translations, oldest first.
    order: VecDeque<(Pid, u64)>,
    /// The maximum number of cached translations.
    capacity: usize,
    /// The number of lookups that found a translation.
    hits: u64,
    /// The number of lookups that did not.
    misses: u64,
}

impl Default for Tlb {
    fn default() -> Self {
        Self::new(DEFAULT_TLB_CAPACITY)
    }
}

impl Tlb {
    /// Create an empty [Tlb] holding at most `capacity` translations.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            order: VecDeque::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up the frame of `page_number` in the address space of `pid`.
    pub fn lookup(&mut self, pid: Pid, page_number: u64) -> Option<PhysAddr> {
        let frame = self.entries.get(&(pid, page_number)).copied();
        if frame.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        frame
    }

    /// Cache a translation, evicting the oldest one if the [Tlb] is full.
    pub fn insert(&mut self, pid: Pid, page_number: u64, frame: PhysAddr) {
        let key = (pid, page_number);
        if let Some(cached) = self.entries.get_mut(&key) {
            *cached = frame;
            return;
        }

        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(key, frame);
        self.order.push_back(key);
    }

    /// Drop every cached translation. Hit and miss counters are kept.
    pub fn flush(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Returns the number of cached translations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no translations are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of cached translations.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of lookups that hit.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Returns the number of lookups that missed.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    #[test]
    fn hit_and_miss() {
        let mut tlb = Tlb::new(4);
        assert_eq!(tlb.lookup(1, 7), None);
        tlb.insert(1, 7, 0x2000);
        assert_eq!(tlb.lookup(1, 7), Some(0x2000));
        assert_eq!(tlb.lookup(2, 7), None);
        assert_eq!((tlb.hits(), tlb.misses()), (1, 2));
    }

    #[test]
    fn evicts_oldest() {
        let mut tlb = Tlb::new(2);
        tlb.insert(0, 1, 0x1000);
        tlb.insert(0, 2, 0x2000);
        tlb.insert(0, 3, 0x3000);
        assert_eq!(tlb.len(), 2);
        assert_eq!(tlb.lookup(0, 1), None);
        assert_eq!(tlb.lookup(0, 2), Some(0x2000));
        assert_eq!(tlb.lookup(0, 3), Some(0x3000));
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut tlb = Tlb::new(2);
        tlb.insert(0, 1, 0x1000);
        tlb.insert(0, 2, 0x2000);
        tlb.insert(0, 1, 0x5000);
        tlb.insert(0, 3, 0x3000);
        assert_eq!(tlb.lookup(0, 1), None);
        assert_eq!(tlb.lookup(0, 2), Some(0x2000));
    }

    #[test]
    fn flush() {
        let mut tlb = Tlb::default();
        tlb.insert(0, 1, 0x1000);
        tlb.flush();
        assert!(tlb.is_empty());
        assert_eq!(tlb.capacity(), DEFAULT_TLB_CAPACITY);
    }

    #[test]
    fn random_inserts_stay_bounded() {
        let mut rng = rand::thread_rng();
        let mut tlb = Tlb::new(16);
        let mut inserted = Vec::new();
        for _ in 0..1_000 {
            let key = (rng.gen_range(0..4), rng.gen_range(0..64));
            if tlb.lookup(key.0, key.1).is_none() {
                tlb.insert(key.0, key.1, key.1 << 12);
                inserted.push(key);
            }
            assert!(tlb.len() <= tlb.capacity());
        }

        // The last `capacity` distinct misses are exactly what remains cached.
        for &(pid, page_number) in inserted.iter().rev().take(16) {
            assert_eq!(tlb.lookup(pid, page_number), Some(page_number << 12));
        }
    }
}
