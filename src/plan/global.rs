//! The global part of a plan implementation.

use super::PlanConstraints;
use crate::plan::marksweep::MarkSweep;
use crate::plan::refcount::RefCount;
use crate::plan::semispace::SemiSpace;
use crate::util::address::{Address, CellOffset, ObjectReference};
use crate::util::error::{GcError, Result};
use crate::util::freelist::{FreeList, RangeFreeList};
use crate::util::header;
use crate::util::memory::Memory;
use crate::util::options::{Options, PlanSelector};
use crate::util::sanity::{SanityChecker, SanityReport};
use crate::util::statistics::GcStats;
use crate::vm::{RootSet, ScopeStack, Var};

/// Create the plan selected by `options.plan`, with a fresh [`ScopeStack`] as its root set.
pub fn create_plan(options: Options) -> Box<dyn Plan<Roots = ScopeStack>> {
    create_plan_with_roots(options, ScopeStack::new())
}

/// Create the plan selected by `options.plan`, using `roots` to find the roots.
pub fn create_plan_with_roots<R: RootSet + 'static>(
    options: Options,
    roots: R,
) -> Box<dyn Plan<Roots = R>> {
    let plan: Box<dyn Plan<Roots = R>> = match options.plan {
        PlanSelector::SemiSpace => Box::new(SemiSpace::new(options, roots)),
        PlanSelector::MarkSweep => Box::new(MarkSweep::new(options, roots)),
        PlanSelector::RefCount => Box::new(RefCount::new(options, roots)),
    };
    info!(
        "Created {} plan with a heap of {} cells",
        plan.constraints().name,
        plan.base().memory.capacity()
    );
    plan
}

/// A plan describes the global core functionality for all memory management schemes.
/// All plans should implement this trait.
///
/// The mutator operations (`assign`, `read_field`, `write_field`, `clear`, `end_scope`) are
/// provided on top of [`BasePlan`]. A plan overrides them when it needs to keep its metadata
/// in step with the mutation, as reference counting does.
pub trait Plan {
    type Roots: RootSet;

    fn constraints(&self) -> &'static PlanConstraints;

    fn base(&self) -> &BasePlan<Self::Roots>;
    fn base_mut(&mut self) -> &mut BasePlan<Self::Roots>;

    /// Allocate `size` cells without collecting. Returns `Ok(None)` if there is no room.
    fn alloc_once(&mut self, size: CellOffset) -> Result<Option<ObjectReference>>;

    /// Run one collection.
    fn collect(&mut self) -> Result<()>;

    /// Allocate an object with `size` data cells and bind `var` to it. If the fast path fails,
    /// collect once (if the plan reclaims in collections) and retry; if that fails too, the heap
    /// is out of memory and nothing changes.
    fn alloc(&mut self, var: Var, size: CellOffset) -> Result<ObjectReference> {
        // Reject an unknown Var, or a size no heap can hold, before touching the heap.
        self.get(var)?;
        let cells = header::total_cells(size)?;
        let object = match self.alloc_once(size)? {
            Some(object) => object,
            None => {
                if self.constraints().needs_collection {
                    debug!(
                        "[POLL] {}: cannot allocate {} cells, triggering collection",
                        self.constraints().name,
                        cells
                    );
                    self.collect()?;
                }
                self.alloc_once(size)?.ok_or_else(|| {
                    info!(
                        "{}: out of memory allocating {} cells",
                        self.constraints().name,
                        cells
                    );
                    GcError::OutOfMemory { requested: cells }
                })?
            }
        };
        trace!("alloc {:?} = {} ({} cells)", var, object, size);
        self.base_mut().stats.objects_allocated += 1;
        self.bind_new_object(var, object)?;
        Ok(object)
    }

    /// Bind `var` to a freshly allocated `object`.
    fn bind_new_object(&mut self, var: Var, object: ObjectReference) -> Result<()> {
        self.base_mut().roots.set(var, Some(object))
    }

    /// Declare a new null Var in the innermost scope.
    fn declare(&mut self) -> Result<Var> {
        self.base_mut().roots.declare()
    }

    /// `dst = src`
    fn assign(&mut self, dst: Var, src: Var) -> Result<()> {
        self.base_mut().assign(dst, src)
    }

    /// `var = null`
    fn clear(&mut self, var: Var) -> Result<()> {
        self.base_mut().roots.set(var, None)
    }

    /// `dst = src.fields[offset]`
    fn read_field(&mut self, dst: Var, src: Var, offset: CellOffset) -> Result<()> {
        self.base_mut().read_field(dst, src, offset)
    }

    /// `target.fields[offset] = src`
    fn write_field(&mut self, target: Var, offset: CellOffset, src: Var) -> Result<()> {
        self.base_mut().write_field(target, offset, src)
    }

    fn begin_scope(&mut self) {
        self.base_mut().roots.begin_scope()
    }

    fn end_scope(&mut self) -> Result<()> {
        self.base_mut().roots.end_scope().map(|_| ())
    }

    /// The object `var` is bound to.
    fn get(&self, var: Var) -> Result<Option<ObjectReference>> {
        self.base().roots.get(var)
    }

    /// The reference held in `var.fields[offset]`, without creating a new reference to it.
    fn load_field(&self, var: Var, offset: CellOffset) -> Result<Option<ObjectReference>> {
        let base = self.base();
        let object = base.deref(var)?;
        base.load_reference(object, offset)
    }

    /// The number of data cells of the object `var` is bound to.
    fn object_size(&self, var: Var) -> Result<CellOffset> {
        let base = self.base();
        header::load_size(&base.memory, base.deref(var)?)
    }

    fn stats(&self) -> &GcStats {
        &self.base().stats
    }

    /// Drain the reclaimed-object log, oldest first. Always empty unless the
    /// `record_reclamation` option is set.
    fn take_reclaimed(&mut self) -> Vec<ObjectReference> {
        std::mem::take(&mut self.base_mut().reclaimed)
    }

    /// Verify the heap: every object reachable from the roots has a valid header and only
    /// references valid objects. Returns an error if a header is malformed; plans may assert
    /// further invariants.
    fn sanity_check(&self) -> Result<SanityReport> {
        SanityChecker::new().check(self.base())
    }

    /// Run the sanity check after a collection if it is enabled.
    fn sanity_check_after_gc(&self) -> Result<()> {
        if cfg!(feature = "sanity") || self.base().options.sanity {
            let report = self.sanity_check()?;
            debug!(
                "{}: sanity check passed, {} live objects",
                self.constraints().name,
                report.live_objects
            );
        }
        Ok(())
    }
}

/// BasePlan holds the state every plan shares: the memory, the free list beneath mark-sweep and
/// reference counting, the root set, options and statistics. It provides the primitive mutator
/// operations, without any plan-specific bookkeeping.
pub struct BasePlan<R: RootSet> {
    pub options: Options,
    pub memory: Memory,
    /// Not used by copying plans, which bump-allocate.
    pub free_list: RangeFreeList,
    pub roots: R,
    pub stats: GcStats,
    reclaimed: Vec<ObjectReference>,
}

impl<R: RootSet> BasePlan<R> {
    pub fn new(options: Options, roots: R) -> BasePlan<R> {
        let heap_size = options.heap_size;
        BasePlan {
            memory: Memory::new(heap_size),
            free_list: RangeFreeList::new(Address::ZERO, heap_size),
            roots,
            stats: GcStats::default(),
            reclaimed: vec![],
            options,
        }
    }

    /// Take an object of `size` data cells from the free list and initialize its header.
    pub fn alloc_from_free_list(
        &mut self,
        size: CellOffset,
        aux: isize,
    ) -> Result<Option<ObjectReference>> {
        match self.free_list.alloc(header::total_cells(size)?) {
            Some(start) => header::initialize_object(&mut self.memory, start, size, aux).map(Some),
            None => Ok(None),
        }
    }

    /// Give the cells of `object`, header included, back to the free list.
    pub fn release(&mut self, object: ObjectReference) -> Result<()> {
        let size = header::load_size(&self.memory, object)?;
        let start = header::object_start(object)?;
        self.free_list.release(start, header::total_cells(size)?);
        self.record_reclaimed(object, size)
    }

    pub fn record_reclaimed(&mut self, object: ObjectReference, size: CellOffset) -> Result<()> {
        trace!("reclaim {} ({} cells)", object, size);
        self.stats.objects_reclaimed += 1;
        self.stats.cells_reclaimed += header::total_cells(size)?;
        if self.options.record_reclamation {
            self.reclaimed.push(object);
        }
        Ok(())
    }

    /// The object `var` is bound to, or [`GcError::NullReference`].
    pub fn deref(&self, var: Var) -> Result<ObjectReference> {
        self.roots.get(var)?.ok_or(GcError::NullReference(var))
    }

    pub fn load_reference(
        &self,
        object: ObjectReference,
        offset: CellOffset,
    ) -> Result<Option<ObjectReference>> {
        let word = header::load_field(&self.memory, object, offset)?;
        let reference = ObjectReference::from_word(word);
        if let Some(reference) = reference {
            self.check_object(reference)?;
        }
        Ok(reference)
    }

    /// Check that `object` has a header that fits in the memory.
    pub fn check_object(&self, object: ObjectReference) -> Result<()> {
        header::ObjectHeader::load(&self.memory, object).map(|_| ())
    }

    pub fn assign(&mut self, dst: Var, src: Var) -> Result<()> {
        let value = self.roots.get(src)?;
        self.roots.set(dst, value)
    }

    pub fn read_field(&mut self, dst: Var, src: Var, offset: CellOffset) -> Result<()> {
        self.roots.get(dst)?;
        let value = self.load_reference(self.deref(src)?, offset)?;
        self.roots.set(dst, value)
    }

    pub fn write_field(&mut self, target: Var, offset: CellOffset, src: Var) -> Result<()> {
        let object = self.deref(target)?;
        let value = self.roots.get(src)?;
        header::store_field(
            &mut self.memory,
            object,
            offset,
            ObjectReference::word_of(value),
        )
    }
}
