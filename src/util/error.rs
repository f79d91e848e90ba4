use thiserror::Error;

use crate::util::address::{Address, CellOffset, ObjectReference, Word};
use crate::vm::Var;

/// The errors a plan can report to its caller.
///
/// [`GcError::OutOfMemory`] is the only error a well-behaved caller can observe. The others
/// report a caller passing something that was never handed out by the plan (a bad address or
/// field offset, or a stale Var), which is checked instead of trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcError {
    /// The heap cannot provide `requested` contiguous cells, even after a collection.
    #[error("out of memory: cannot allocate {requested} cells")]
    OutOfMemory { requested: CellOffset },

    /// A word or object does not denote a valid location in the heap.
    #[error("invalid address {address}")]
    InvalidAddress { address: Word },

    /// A field offset is not within the object's data cells.
    #[error("field offset {offset} is out of bounds for {object} of size {size}")]
    FieldOutOfBounds {
        object: ObjectReference,
        offset: CellOffset,
        size: CellOffset,
    },

    /// A field was read or written through a null Var.
    #[error("{0:?} is null")]
    NullReference(Var),

    /// The Var does not belong to any open scope.
    #[error("{0:?} is not a live variable")]
    UnknownVar(Var),

    /// A root operation needs an open scope, but there is none.
    #[error("no open scope")]
    NoOpenScope,
}

impl GcError {
    pub(crate) fn invalid_address(address: Address) -> Self {
        GcError::InvalidAddress {
            address: address.as_usize() as Word,
        }
    }
}

pub type Result<T> = std::result::Result<T, GcError>;
