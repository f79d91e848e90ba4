//! The interface between a runtime and the collectors.
//!
//! A runtime decides which variables are roots. See [`RootSet`].

mod roots;

pub use self::roots::{RootSet, RootVisitor, ScopeStack, Var};
