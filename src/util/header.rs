//! The object layout shared by all plans.
//!
//! ```text
//!  start          object
//!    |              |
//!    v              v
//!    +------+------+--------+--------+-----+
//!    | aux  | size | data 0 | data 1 | ... |
//!    +------+------+--------+--------+-----+
//!    obj-2  obj-1
//! ```
//!
//! `size` is the number of data cells. `aux` belongs to the plan: the forwarding word for
//! semi-space, the [`MarkState`] for mark-sweep, and the reference count for reference counting.
//! Data cells are only reachable through [`load_field`]/[`store_field`], which reject offsets
//! outside `[0, size)`, so a header can never be read or clobbered as a field.

use static_assertions::const_assert_eq;

use crate::util::address::{Address, CellOffset, ObjectReference, Word};
use crate::util::constants::{AUX_OFFSET, HEADER_CELLS, NULL_WORD, SIZE_OFFSET};
use crate::util::error::{GcError, Result};
use crate::util::memory::Memory;

// The aux cell is the first cell of the header, so the header starts at `object - AUX_OFFSET`.
const_assert_eq!(AUX_OFFSET, HEADER_CELLS);
const_assert_eq!(SIZE_OFFSET + 1, HEADER_CELLS);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObjectHeader {
    pub size: CellOffset,
    pub aux: Word,
}

impl ObjectHeader {
    /// Read and validate the header of `object`: the header and all data cells must be inside
    /// the memory.
    pub fn load(memory: &Memory, object: ObjectReference) -> Result<ObjectHeader> {
        let start = object_start(object)?;
        let size = memory.load(start + (AUX_OFFSET - SIZE_OFFSET))?;
        let aux = memory.load(start)?;
        if size < 0 || !memory.contains_range(start, HEADER_CELLS + size as usize) {
            return Err(GcError::invalid_address(object.to_address()));
        }
        Ok(ObjectHeader {
            size: size as CellOffset,
            aux,
        })
    }

    pub fn store(self, memory: &mut Memory, object: ObjectReference) -> Result<()> {
        let start = object_start(object)?;
        memory.store(start + (AUX_OFFSET - SIZE_OFFSET), self.size as Word)?;
        memory.store(start, self.aux)
    }
}

/// The first header cell of `object`.
pub fn object_start(object: ObjectReference) -> Result<Address> {
    object
        .to_address()
        .checked_sub(HEADER_CELLS)
        .ok_or_else(|| GcError::invalid_address(object.to_address()))
}

/// The object whose header starts at `start`.
pub fn object_at(start: Address) -> ObjectReference {
    ObjectReference::from_address(start + HEADER_CELLS)
}

/// The number of cells an object of `size` data cells occupies, header included. A size too
/// large to be counted in cells could never be allocated, so it is out of memory.
pub fn total_cells(size: CellOffset) -> Result<CellOffset> {
    size.checked_add(HEADER_CELLS).ok_or(GcError::OutOfMemory {
        requested: CellOffset::MAX,
    })
}

pub fn load_size(memory: &Memory, object: ObjectReference) -> Result<CellOffset> {
    ObjectHeader::load(memory, object).map(|h| h.size)
}

pub fn load_aux(memory: &Memory, object: ObjectReference) -> Result<Word> {
    ObjectHeader::load(memory, object).map(|h| h.aux)
}

pub fn store_aux(memory: &mut Memory, object: ObjectReference, aux: Word) -> Result<()> {
    // Validates the header before writing.
    ObjectHeader::load(memory, object)?;
    memory.store(object_start(object)?, aux)
}

/// Write a fresh header at `start` and null all `size` data cells.
pub fn initialize_object(
    memory: &mut Memory,
    start: Address,
    size: CellOffset,
    aux: Word,
) -> Result<ObjectReference> {
    let object = object_at(start);
    memory.fill(object.to_address(), size, NULL_WORD)?;
    ObjectHeader { size, aux }.store(memory, object)?;
    Ok(object)
}

fn field_address(memory: &Memory, object: ObjectReference, offset: CellOffset) -> Result<Address> {
    let size = load_size(memory, object)?;
    if offset >= size {
        return Err(GcError::FieldOutOfBounds {
            object,
            offset,
            size,
        });
    }
    Ok(object.to_address() + offset)
}

pub fn load_field(memory: &Memory, object: ObjectReference, offset: CellOffset) -> Result<Word> {
    memory.load(field_address(memory, object, offset)?)
}

pub fn store_field(
    memory: &mut Memory,
    object: ObjectReference,
    offset: CellOffset,
    value: Word,
) -> Result<()> {
    let addr = field_address(memory, object, offset)?;
    memory.store(addr, value)
}

/// The references held in the data cells of `object`, in field order.
pub fn children(memory: &Memory, object: ObjectReference) -> Result<Vec<ObjectReference>> {
    let size = load_size(memory, object)?;
    let mut children = Vec::new();
    for i in 0..size {
        if let Some(child) = ObjectReference::from_word(memory.load(object.to_address() + i)?) {
            children.push(child);
        }
    }
    Ok(children)
}

/// The per-cycle state kept in the aux cell by mark-sweep. It only means something while a
/// collection is running: every object is [`MarkState::Unvisited`] between collections.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkState {
    Unvisited = 0,
    Visited = 1,
}

impl MarkState {
    pub fn from_word(word: Word) -> MarkState {
        if word == MarkState::Visited as Word {
            MarkState::Visited
        } else {
            MarkState::Unvisited
        }
    }

    pub fn to_word(self) -> Word {
        self as Word
    }
}
