//! Plan: semi-space copying collection.

mod global;

pub use self::global::SemiSpace;
pub use self::global::SS_CONSTRAINTS;
