use std::collections::BTreeSet;

use crate::plan::global::BasePlan;
use crate::plan::Plan;
use crate::plan::PlanConstraints;
use crate::util::address::{CellOffset, ObjectReference};
use crate::util::error::{GcError, Result};
use crate::util::freelist::FreeList;
use crate::util::header::{self, MarkState};
use crate::util::options::Options;
use crate::util::sanity::{SanityChecker, SanityReport};
use crate::vm::RootSet;

/// Mark-sweep: objects come from the free list, and a collection marks everything reachable
/// from the roots, then gives every unmarked object back to the free list.
pub struct MarkSweep<R: RootSet> {
    pub base: BasePlan<R>,
    /// Every object allocated and not yet swept.
    allocated: BTreeSet<ObjectReference>,
}

pub const MS_CONSTRAINTS: PlanConstraints = PlanConstraints {
    name: "MarkSweep",
    ..PlanConstraints::default()
};

/// The outcome of one mark-sweep collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MarkSweepResult {
    pub marked: usize,
    pub swept: usize,
}

impl<R: RootSet> Plan for MarkSweep<R> {
    type Roots = R;

    fn constraints(&self) -> &'static PlanConstraints {
        &MS_CONSTRAINTS
    }

    fn base(&self) -> &BasePlan<R> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BasePlan<R> {
        &mut self.base
    }

    fn alloc_once(&mut self, size: CellOffset) -> Result<Option<ObjectReference>> {
        let object = self
            .base
            .alloc_from_free_list(size, MarkState::Unvisited.to_word())?;
        if let Some(object) = object {
            self.allocated.insert(object);
        }
        Ok(object)
    }

    fn collect(&mut self) -> Result<()> {
        self.mark_and_sweep().map(|_| ())
    }

    fn sanity_check(&self) -> Result<SanityReport> {
        let report = SanityChecker::new().check(&self.base)?;
        for object in report.live() {
            assert!(
                self.allocated.contains(&object),
                "live object {} is not an allocated object",
                object
            );
            assert_eq!(
                MarkState::from_word(header::load_aux(&self.base.memory, object)?),
                MarkState::Unvisited,
                "live object {} is still marked",
                object
            );
        }
        Ok(report)
    }
}

impl<R: RootSet> MarkSweep<R> {
    pub fn new(options: Options, roots: R) -> Self {
        MarkSweep {
            base: BasePlan::new(options, roots),
            allocated: BTreeSet::new(),
        }
    }

    /// The objects allocated and not yet reclaimed, in address order.
    pub fn allocated_objects(&self) -> impl Iterator<Item = ObjectReference> + '_ {
        self.allocated.iter().copied()
    }

    pub fn is_allocated(&self, object: ObjectReference) -> bool {
        self.allocated.contains(&object)
    }

    /// Run a full collection.
    pub fn mark_and_sweep(&mut self) -> Result<MarkSweepResult> {
        let marked = self.mark()?;
        let swept = self.sweep()?;
        self.base.stats.collections += 1;
        info!(
            "[GC {}] MarkSweep: marked {} objects, swept {}, {} cells free",
            self.base.stats.collections,
            marked,
            swept,
            self.base.free_list.free_cells()
        );
        self.sanity_check_after_gc()?;
        Ok(MarkSweepResult { marked, swept })
    }

    /// Mark every object reachable from the roots. Each object is marked before its children are
    /// pushed, so an object is visited once however many paths lead to it.
    fn mark(&mut self) -> Result<usize> {
        let mut worklist = self.base.roots.roots();
        let mut marked = 0;
        while let Some(object) = worklist.pop() {
            if !self.allocated.contains(&object) {
                return Err(GcError::InvalidAddress {
                    address: object.to_word(),
                });
            }
            let memory = &mut self.base.memory;
            if MarkState::from_word(header::load_aux(memory, object)?) == MarkState::Visited {
                continue;
            }
            header::store_aux(memory, object, MarkState::Visited.to_word())?;
            marked += 1;
            trace!("mark {}", object);
            worklist.extend(header::children(memory, object)?);
        }
        Ok(marked)
    }

    /// Reclaim every unmarked object, and unmark the survivors for the next collection.
    fn sweep(&mut self) -> Result<usize> {
        let mut dead = vec![];
        for &object in self.allocated.iter() {
            let memory = &mut self.base.memory;
            match MarkState::from_word(header::load_aux(memory, object)?) {
                MarkState::Visited => {
                    header::store_aux(memory, object, MarkState::Unvisited.to_word())?
                }
                MarkState::Unvisited => dead.push(object),
            }
        }
        for object in dead.iter() {
            self.base.release(*object)?;
            self.allocated.remove(object);
        }
        Ok(dead.len())
    }
}
