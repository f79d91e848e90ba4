use crate::util::address::{Address, CellOffset, Word};
use crate::util::constants::NULL_WORD;
use crate::util::error::{GcError, Result};

/// The flat cell array all plans allocate from. Every access is bounds-checked.
pub struct Memory {
    cells: Box<[Word]>,
}

impl Memory {
    /// Create a memory of `capacity` cells, all holding [`NULL_WORD`].
    pub fn new(capacity: CellOffset) -> Self {
        Memory {
            cells: vec![NULL_WORD; capacity].into_boxed_slice(),
        }
    }

    /// The number of cells.
    pub fn capacity(&self) -> CellOffset {
        self.cells.len()
    }

    /// Is `[start, start + len)` within the memory?
    pub fn contains_range(&self, start: Address, len: CellOffset) -> bool {
        start
            .as_usize()
            .checked_add(len)
            .is_some_and(|end| end <= self.cells.len())
    }

    pub fn load(&self, addr: Address) -> Result<Word> {
        self.cells
            .get(addr.as_usize())
            .copied()
            .ok_or_else(|| GcError::invalid_address(addr))
    }

    pub fn store(&mut self, addr: Address, value: Word) -> Result<()> {
        let cell = self
            .cells
            .get_mut(addr.as_usize())
            .ok_or_else(|| GcError::invalid_address(addr))?;
        *cell = value;
        Ok(())
    }

    /// Set `len` cells starting at `start` to `value`.
    pub fn fill(&mut self, start: Address, len: CellOffset, value: Word) -> Result<()> {
        if !self.contains_range(start, len) {
            return Err(GcError::invalid_address(start + len));
        }
        let start = start.as_usize();
        self.cells[start..start + len].fill(value);
        Ok(())
    }
}
