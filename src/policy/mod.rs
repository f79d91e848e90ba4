//! Memory policies that can be used for spaces.

/// A bump-allocated region whose live objects are evacuated into another region by a collection.
pub mod copyspace;
