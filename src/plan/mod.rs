//! The collection strategies.
//!
//! Each plan implements the [`Plan`] trait over a [`BasePlan`], which holds the memory, the root
//! set and the free list they share. A plan consists of:
//! * a plan type, which decides where objects are allocated and how a collection runs,
//! * a [`PlanConstraints`] constant describing the properties of the plan,
//! * overrides of the mutator operations, if the plan keeps metadata up to date on mutation.

pub mod global;
pub mod plan_constraints;

pub use self::global::create_plan;
pub use self::global::create_plan_with_roots;
pub use self::global::BasePlan;
pub use self::global::Plan;
pub use self::plan_constraints::PlanConstraints;

pub mod marksweep;
pub mod refcount;
pub mod semispace;
