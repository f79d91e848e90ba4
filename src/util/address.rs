use std::fmt;
use std::ops::*;

use crate::util::constants::NULL_WORD;

/// The content of one cell.
///
/// A non-negative word is the address of an object. A negative word is a raw value that the
/// collectors never interpret, with [`NULL_WORD`] reserved for "no reference".
pub type Word = isize;

/// Distance in cells
pub type CellOffset = usize;

/// Address represents the index of a cell in the flat heap array. It is only a position: it may
/// point to a header cell, a data cell, or past the end of the heap. Bounds are checked when the
/// memory is accessed (see [`crate::util::memory::Memory`]).
#[repr(transparent)]
#[derive(Copy, Clone, Eq, Hash, PartialOrd, Ord, PartialEq, Default)]
pub struct Address(usize);

/// Address + CellOffset
impl Add<CellOffset> for Address {
    type Output = Address;
    fn add(self, offset: CellOffset) -> Address {
        Address(self.0 + offset)
    }
}

/// Address += CellOffset
impl AddAssign<CellOffset> for Address {
    fn add_assign(&mut self, offset: CellOffset) {
        self.0 += offset;
    }
}

/// Address - CellOffset
impl Sub<CellOffset> for Address {
    type Output = Address;
    fn sub(self, offset: CellOffset) -> Address {
        Address(self.0 - offset)
    }
}

/// Address - Address (the first address must be higher)
impl Sub<Address> for Address {
    type Output = CellOffset;
    fn sub(self, other: Address) -> CellOffset {
        debug_assert!(
            self.0 >= other.0,
            "for (addr_a - addr_b), a({}) needs to be larger than b({})",
            self,
            other
        );
        self.0 - other.0
    }
}

impl Address {
    /// The lowest address in the heap.
    pub const ZERO: Self = Address(0);

    pub const fn from_usize(raw: usize) -> Address {
        Address(raw)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Subtract `offset` from the address, returning `None` if it would go below zero.
    pub fn checked_sub(self, offset: CellOffset) -> Option<Address> {
        self.0.checked_sub(offset).map(Address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// ObjectReference is the address of the first data cell of an object. The two header cells
/// live immediately before it. An `ObjectReference` is never null; a nullable reference is an
/// `Option<ObjectReference>`, which is what a cell or a [`crate::vm::Var`] holds.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, Hash, PartialOrd, Ord, PartialEq)]
pub struct ObjectReference(Address);

impl ObjectReference {
    pub const fn from_address(addr: Address) -> ObjectReference {
        ObjectReference(addr)
    }

    pub const fn to_address(self) -> Address {
        self.0
    }

    /// Decode a cell value. Negative words are raw values, not references.
    pub fn from_word(word: Word) -> Option<ObjectReference> {
        if word < 0 {
            None
        } else {
            Some(ObjectReference(Address(word as usize)))
        }
    }

    pub fn to_word(self) -> Word {
        self.0 .0 as Word
    }

    /// Encode a nullable reference as a cell value.
    pub fn word_of(reference: Option<ObjectReference>) -> Word {
        reference.map_or(NULL_WORD, ObjectReference::to_word)
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
