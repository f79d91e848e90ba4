use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use crate::util::address::{Address, CellOffset};

/// A pool of disjoint cell ranges available for allocation.
pub trait FreeList {
    /// Take `size` contiguous cells out of the pool. Returns `None` if no free range is large enough.
    fn alloc(&mut self, size: CellOffset) -> Option<Address>;

    /// Return `[start, start + size)` to the pool. The range must not be free already.
    fn release(&mut self, start: Address, size: CellOffset);

    /// Total number of free cells.
    fn free_cells(&self) -> CellOffset;

    /// Size of the largest free range, i.e. the largest allocation that can currently succeed.
    fn largest_range(&self) -> CellOffset;
}

/// First-fit free list over address-ordered ranges. Adjacent free ranges are coalesced on release.
#[derive(Debug, Clone)]
pub struct RangeFreeList {
    /// start -> length
    ranges: BTreeMap<Address, CellOffset>,
    free: CellOffset,
}

impl RangeFreeList {
    /// A free list with `[start, start + units)` free.
    pub fn new(start: Address, units: CellOffset) -> Self {
        let mut fl = RangeFreeList {
            ranges: BTreeMap::new(),
            free: 0,
        };
        if units > 0 {
            fl.release(start, units);
        }
        fl
    }

    /// The free ranges in address order, as `(start, length)`.
    pub fn ranges(&self) -> impl Iterator<Item = (Address, CellOffset)> + '_ {
        self.ranges.iter().map(|(start, len)| (*start, *len))
    }

    fn predecessor(&self, start: Address) -> Option<(Address, CellOffset)> {
        self.ranges
            .range(..start)
            .next_back()
            .map(|(s, l)| (*s, *l))
    }

    fn successor(&self, start: Address) -> Option<(Address, CellOffset)> {
        self.ranges
            .range((Excluded(start), Unbounded))
            .next()
            .map(|(s, l)| (*s, *l))
    }
}

impl FreeList for RangeFreeList {
    fn alloc(&mut self, size: CellOffset) -> Option<Address> {
        debug_assert!(size > 0);
        let (start, len) = self.ranges().find(|(_, len)| *len >= size)?;
        self.ranges.remove(&start);
        if len > size {
            self.ranges.insert(start + size, len - size);
        }
        self.free -= size;
        trace!("freelist: alloc {} cells at {}", size, start);
        Some(start)
    }

    fn release(&mut self, start: Address, size: CellOffset) {
        debug_assert!(size > 0);
        debug_assert!(
            !self.ranges.contains_key(&start)
                && self.predecessor(start).map_or(true, |(s, l)| s + l <= start)
                && self.successor(start).map_or(true, |(s, _)| start + size <= s),
            "releasing {} ({} cells) overlaps a free range",
            start,
            size
        );
        trace!("freelist: release {} cells at {}", size, start);
        self.free += size;

        let mut start = start;
        let mut size = size;
        if let Some((pred, pred_len)) = self.predecessor(start) {
            if pred + pred_len == start {
                self.ranges.remove(&pred);
                start = pred;
                size += pred_len;
            }
        }
        if let Some((succ, succ_len)) = self.successor(start) {
            if start + size == succ {
                self.ranges.remove(&succ);
                size += succ_len;
            }
        }
        self.ranges.insert(start, size);
    }

    fn free_cells(&self) -> CellOffset {
        self.free
    }

    fn largest_range(&self) -> CellOffset {
        self.ranges.values().copied().max().unwrap_or(0)
    }
}
