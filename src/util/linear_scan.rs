use crate::util::address::Address;
use crate::util::address::ObjectReference;
use crate::util::error::Result;
use crate::util::header;
use crate::util::memory::Memory;

/// Iterate over the objects of a bump-allocated address range, in allocation order. Objects in
/// such a range are contiguous, so each header tells where the next object starts.
pub struct ObjectIterator<'a> {
    memory: &'a Memory,
    cursor: Address,
    end: Address,
}

impl<'a> ObjectIterator<'a> {
    pub fn new(memory: &'a Memory, start: Address, end: Address) -> Self {
        debug_assert!(start <= end);
        ObjectIterator {
            memory,
            cursor: start,
            end,
        }
    }
}

impl Iterator for ObjectIterator<'_> {
    type Item = Result<ObjectReference>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end {
            return None;
        }
        let object = header::object_at(self.cursor);
        match header::load_size(self.memory, object).and_then(header::total_cells) {
            Ok(cells) => {
                self.cursor += cells;
                debug_assert!(self.cursor <= self.end);
                Some(Ok(object))
            }
            Err(e) => {
                // Stop here: without a size there is no way to find the next object.
                self.cursor = self.end;
                Some(Err(e))
            }
        }
    }
}
