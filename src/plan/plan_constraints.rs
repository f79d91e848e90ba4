//! Plan-specific constraints.

/// This struct defines plan-specific constants.
/// Each plan should define their own constraints, usually as a constant derived from [`PlanConstraints::default()`].
#[derive(Debug)]
pub struct PlanConstraints {
    /// The name of the plan, for logging.
    pub name: &'static str,
    /// True if this plan moves objects. A Var's value may change across a collection.
    pub moves_objects: bool,
    /// True if the plan can reclaim a cycle of garbage.
    pub reclaims_cycles: bool,
    /// True if reclamation happens in batches (a collection) rather than on mutation. A plan
    /// without collections retries a failed allocation without collecting.
    pub needs_collection: bool,
}

impl PlanConstraints {
    /// A const function to create the default plan constraints.
    pub const fn default() -> Self {
        PlanConstraints {
            name: "",
            moves_objects: false,
            reclaims_cycles: true,
            needs_collection: true,
        }
    }
}
