//! Utilities shared by the plans: the cell memory, object headers, allocation and verification.

pub mod address;
pub mod constants;
pub mod error;
pub mod freelist;
pub mod header;
pub mod linear_scan;
pub mod logger;
pub mod memory;
pub mod options;
pub mod sanity;
pub mod statistics;

pub use self::address::Address;
pub use self::address::ObjectReference;
pub use self::address::Word;
