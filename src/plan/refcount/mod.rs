//! Plan: reference counting over the free list.
//!
//! Each object carries a count of the references to it, held in its aux cell. Every mutator
//! operation that makes a root or a field point somewhere new adjusts the counts, and an object
//! is reclaimed as soon as its count drops to zero. There is no tracing, so garbage cycles are
//! never reclaimed.

mod global;

pub use self::global::RefCount;
pub use self::global::RC_CONSTRAINTS;
