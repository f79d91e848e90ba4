use crate::util::address::{Address, CellOffset, ObjectReference};
use crate::util::constants::NULL_WORD;
use crate::util::error::{GcError, Result};
use crate::util::header;
use crate::util::linear_scan::ObjectIterator;
use crate::util::memory::Memory;

/// One half of a semi-space heap: a contiguous region allocated by bumping a cursor.
///
/// Outside a collection the aux header cell of every object holds [`NULL_WORD`]. While the
/// region is the from-space of a collection, an evacuated object's aux cell holds the address
/// of its copy (its forwarding pointer).
#[derive(Debug)]
pub struct CopySpace {
    name: &'static str,
    start: Address,
    extent: CellOffset,
    cursor: Address,
    from_space: bool,
}

impl CopySpace {
    pub fn new(name: &'static str, start: Address, extent: CellOffset, from_space: bool) -> Self {
        CopySpace {
            name,
            start,
            extent,
            cursor: start,
            from_space,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cells allocated so far.
    pub fn used_cells(&self) -> CellOffset {
        self.cursor - self.start
    }

    pub fn available_cells(&self) -> CellOffset {
        self.extent - self.used_cells()
    }

    pub fn contains(&self, object: ObjectReference) -> bool {
        let addr = object.to_address();
        addr >= self.start && addr < self.start + self.extent
    }

    /// Is this region being evacuated by the collection in progress?
    pub fn is_from_space(&self) -> bool {
        self.from_space
    }

    /// Make this region the from-space of the coming collection.
    pub fn prepare(&mut self, from_space: bool) {
        self.from_space = from_space;
    }

    /// Abandon everything in the region. The next object is allocated at its start.
    pub fn release(&mut self) {
        self.cursor = self.start;
        self.from_space = false;
    }

    /// Bump-allocate an object with `size` data cells, or `None` if the region is full.
    pub fn alloc(
        &mut self,
        memory: &mut Memory,
        size: CellOffset,
    ) -> Result<Option<ObjectReference>> {
        debug_assert!(!self.from_space, "{}: allocating in the from-space", self.name);
        let cells = header::total_cells(size)?;
        if cells > self.available_cells() {
            trace!(
                "{}: {} cells requested, {} available",
                self.name,
                cells,
                self.available_cells()
            );
            return Ok(None);
        }
        let object = header::initialize_object(memory, self.cursor, size, NULL_WORD)?;
        self.cursor += cells;
        trace!(
            "Bump allocation size: {}, result: {}, new_cursor: {}",
            size,
            object,
            self.cursor
        );
        Ok(Some(object))
    }

    /// The objects allocated in the region, in allocation order.
    pub fn objects<'a>(&self, memory: &'a Memory) -> ObjectIterator<'a> {
        ObjectIterator::new(memory, self.start, self.cursor)
    }

    /// Where `object` has been copied to, if it has been evacuated in this collection.
    pub fn forwarding_pointer(
        memory: &Memory,
        object: ObjectReference,
    ) -> Result<Option<ObjectReference>> {
        header::load_aux(memory, object).map(ObjectReference::from_word)
    }

    /// Copy the header of `object` into this (to-)space and install the forwarding pointer
    /// in the original. The data cells are filled in by the caller.
    fn evacuate(
        &mut self,
        memory: &mut Memory,
        object: ObjectReference,
    ) -> Result<ObjectReference> {
        let size = header::load_size(memory, object)?;
        let new_object = match self.alloc(memory, size)? {
            Some(new_object) => new_object,
            None => {
                return Err(GcError::OutOfMemory {
                    requested: header::total_cells(size)?,
                })
            }
        };
        // Forward before scanning the children, so a cycle back to `object` finds the copy.
        header::store_aux(memory, object, new_object.to_word())?;
        trace!("Copying [{} -> {}]", object, new_object);
        Ok(new_object)
    }

    /// Trace `object` into this (to-)space: return its copy, copying it and everything reachable
    /// from it that has not been copied yet.
    ///
    /// Objects are copied depth-first in field order, as a recursive copy would. Every object is
    /// copied at most once, so cycles terminate and shared objects stay shared.
    pub fn trace_object(
        &mut self,
        memory: &mut Memory,
        object: ObjectReference,
        copied: &mut usize,
    ) -> Result<ObjectReference> {
        if let Some(new_object) = Self::forwarding_pointer(memory, object)? {
            return Ok(new_object);
        }
        let new_object = self.evacuate(memory, object)?;
        *copied += 1;

        // (original, copy, next field, size)
        let mut stack = vec![(object, new_object, 0, header::load_size(memory, object)?)];
        while let Some((old, new, i, size)) = stack.pop() {
            if i == size {
                continue;
            }
            stack.push((old, new, i + 1, size));

            let word = header::load_field(memory, old, i)?;
            let value = match ObjectReference::from_word(word) {
                // Raw value or null: copy verbatim.
                None => word,
                Some(child) => match Self::forwarding_pointer(memory, child)? {
                    Some(forwarded) => forwarded.to_word(),
                    None => {
                        let child_copy = self.evacuate(memory, child)?;
                        *copied += 1;
                        let child_size = header::load_size(memory, child)?;
                        stack.push((child, child_copy, 0, child_size));
                        child_copy.to_word()
                    }
                },
            };
            header::store_field(memory, new, i, value)?;
        }
        Ok(new_object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(memory_size: usize) -> (Memory, CopySpace, CopySpace) {
        let half = memory_size / 2;
        (
            Memory::new(memory_size),
            CopySpace::new("copyspace0", Address::ZERO, half, false),
            CopySpace::new("copyspace1", Address::from_usize(half), half, false),
        )
    }

    #[test]
    fn release_empties_the_from_space() {
        let (mut memory, mut space, _) = space(20);
        space.alloc(&mut memory, 2).unwrap().unwrap();
        space.prepare(true);
        assert!(space.is_from_space());
        assert_eq!(space.used_cells(), 4);
        space.release();
        assert!(!space.is_from_space());
        assert_eq!(space.used_cells(), 0);
        assert_eq!(space.available_cells(), 10);
    }

    #[test]
    fn bump_allocation_until_full() {
        let (mut memory, mut space, _) = space(20);
        let a = space.alloc(&mut memory, 4).unwrap().unwrap();
        assert_eq!(a.to_address(), Address::from_usize(2));
        assert_eq!(space.used_cells(), 6);
        assert_eq!(space.alloc(&mut memory, 3).unwrap(), None);
        let b = space.alloc(&mut memory, 2).unwrap().unwrap();
        assert_eq!(b.to_address(), Address::from_usize(8));
        assert_eq!(space.available_cells(), 0);
        assert_eq!(space.objects(&memory).collect::<Result<Vec<_>>>(), Ok(vec![a, b]));
    }

    #[test]
    fn trace_copies_shared_object_once() {
        let (mut memory, mut to, mut from) = space(40);
        let shared = from.alloc(&mut memory, 1).unwrap().unwrap();
        let parent = from.alloc(&mut memory, 2).unwrap().unwrap();
        from.prepare(true);
        header::store_field(&mut memory, shared, 0, -5).unwrap();
        header::store_field(&mut memory, parent, 0, shared.to_word()).unwrap();
        header::store_field(&mut memory, parent, 1, shared.to_word()).unwrap();

        let mut copied = 0;
        let new_parent = to.trace_object(&mut memory, parent, &mut copied).unwrap();
        assert_eq!(copied, 2);
        assert!(to.contains(new_parent));
        let f0 = header::load_field(&memory, new_parent, 0).unwrap();
        let f1 = header::load_field(&memory, new_parent, 1).unwrap();
        assert_eq!(f0, f1);
        let new_shared = ObjectReference::from_word(f0).unwrap();
        assert!(to.contains(new_shared));
        assert_eq!(header::load_field(&memory, new_shared, 0), Ok(-5));

        // A second trace finds the forwarding pointer.
        assert_eq!(to.trace_object(&mut memory, parent, &mut copied), Ok(new_parent));
        assert_eq!(copied, 2);
    }

    #[test]
    fn trace_terminates_on_cycles() {
        let (mut memory, mut to, mut from) = space(40);
        let a = from.alloc(&mut memory, 1).unwrap().unwrap();
        let b = from.alloc(&mut memory, 1).unwrap().unwrap();
        from.prepare(true);
        header::store_field(&mut memory, a, 0, b.to_word()).unwrap();
        header::store_field(&mut memory, b, 0, a.to_word()).unwrap();

        let mut copied = 0;
        let new_a = to.trace_object(&mut memory, a, &mut copied).unwrap();
        assert_eq!(copied, 2);
        let new_b =
            ObjectReference::from_word(header::load_field(&memory, new_a, 0).unwrap()).unwrap();
        assert_eq!(header::load_field(&memory, new_b, 0), Ok(new_a.to_word()));
        // Copies are not forwarded.
        assert_eq!(CopySpace::forwarding_pointer(&memory, new_a), Ok(None));
        assert_eq!(CopySpace::forwarding_pointer(&memory, new_b), Ok(None));
    }

    #[test]
    fn copy_order_is_depth_first() {
        // root -> [x, y], x -> [z]; a recursive copy visits root, x, z, y.
        let (mut memory, mut to, mut from) = space(60);
        let z = from.alloc(&mut memory, 0).unwrap().unwrap();
        let y = from.alloc(&mut memory, 0).unwrap().unwrap();
        let x = from.alloc(&mut memory, 1).unwrap().unwrap();
        let root = from.alloc(&mut memory, 2).unwrap().unwrap();
        from.prepare(true);
        header::store_field(&mut memory, x, 0, z.to_word()).unwrap();
        header::store_field(&mut memory, root, 0, x.to_word()).unwrap();
        header::store_field(&mut memory, root, 1, y.to_word()).unwrap();

        let mut copied = 0;
        to.trace_object(&mut memory, root, &mut copied).unwrap();
        let order: Vec<_> = to.objects(&memory).collect::<Result<_>>().unwrap();
        let forwarded = |o| CopySpace::forwarding_pointer(&memory, o).unwrap().unwrap();
        assert_eq!(
            order,
            vec![forwarded(root), forwarded(x), forwarded(z), forwarded(y)]
        );
    }
}
