//! Plan: mark-sweep over the free list.

mod global;

pub use self::global::MarkSweep;
pub use self::global::MarkSweepResult;
pub use self::global::MS_CONSTRAINTS;
