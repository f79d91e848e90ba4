use crate::util::address::Word;

/// The word stored in a cell that does not hold a reference.
pub const NULL_WORD: Word = -1;

/// log2 of the number of header cells in front of each object
pub const LOG_HEADER_CELLS: u8 = 1;
/// The number of header cells in front of each object
pub const HEADER_CELLS: usize = 1 << LOG_HEADER_CELLS;

/// Offset (from the object reference) of the header cell holding the object size.
pub const SIZE_OFFSET: usize = 1;
/// Offset (from the object reference) of the collector-specific header cell.
pub const AUX_OFFSET: usize = 2;

/// The default heap size in cells.
pub const DEFAULT_HEAP_CELLS: usize = 1 << 12;

/// The initial reference count of a freshly allocated object: the Var it was allocated into.
pub const INITIAL_REFERENCE_COUNT: Word = 1;
