//! cellgc simulates automatic memory management over a flat array of cells.
//!
//! Objects live in a [`Memory`](util::memory::Memory) of signed words. Each object is a two-cell
//! header followed by its data cells, and a data cell either holds a raw value or refers to
//! another object. Variables ([`Var`](vm::Var)) are declared in nested scopes and act as the
//! roots. Three interchangeable plans manage the heap:
//!
//! * [`SemiSpace`](plan::semispace::SemiSpace): bump allocation, copying collection.
//! * [`MarkSweep`](plan::marksweep::MarkSweep): free-list allocation, tracing collection.
//! * [`RefCount`](plan::refcount::RefCount): free-list allocation, objects reclaimed when their
//!   count drops to zero.
//!
//! A client creates a plan with [`memory_manager::create_plan`] and drives it through the
//! [`Plan`](plan::Plan) trait.

#[macro_use]
extern crate log;

pub mod memory_manager;
pub mod plan;
pub mod policy;
pub mod util;
pub mod vm;

pub use crate::plan::{BasePlan, Plan, PlanConstraints};
pub use crate::util::error::{GcError, Result};
pub use crate::util::options::{Options, PlanSelector};
pub use crate::vm::{RootSet, ScopeStack, Var};
