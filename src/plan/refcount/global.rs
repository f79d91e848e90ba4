use std::collections::HashMap;

use crate::plan::global::BasePlan;
use crate::plan::Plan;
use crate::plan::PlanConstraints;
use crate::util::address::{Address, CellOffset, ObjectReference, Word};
use crate::util::constants::INITIAL_REFERENCE_COUNT;
use crate::util::error::{GcError, Result};
use crate::util::header;
use crate::util::linear_scan::ObjectIterator;
use crate::util::options::Options;
use crate::util::sanity::{SanityChecker, SanityReport};
use crate::vm::{RootSet, Var};

pub struct RefCount<R: RootSet> {
    pub base: BasePlan<R>,
}

pub const RC_CONSTRAINTS: PlanConstraints = PlanConstraints {
    name: "RefCount",
    reclaims_cycles: false,
    needs_collection: false,
    ..PlanConstraints::default()
};

impl<R: RootSet> Plan for RefCount<R> {
    type Roots = R;

    fn constraints(&self) -> &'static PlanConstraints {
        &RC_CONSTRAINTS
    }

    fn base(&self) -> &BasePlan<R> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BasePlan<R> {
        &mut self.base
    }

    fn alloc_once(&mut self, size: CellOffset) -> Result<Option<ObjectReference>> {
        self.base
            .alloc_from_free_list(size, INITIAL_REFERENCE_COUNT)
    }

    /// Garbage is reclaimed as soon as it becomes unreachable, so there is nothing to collect.
    fn collect(&mut self) -> Result<()> {
        debug!("RefCount: collection requested, nothing to do");
        Ok(())
    }

    fn bind_new_object(&mut self, var: Var, object: ObjectReference) -> Result<()> {
        // The new object starts with a count of one, for `var`.
        self.replace_root(var, Some(object))
    }

    fn assign(&mut self, dst: Var, src: Var) -> Result<()> {
        let value = self.base.roots.get(src)?;
        self.base.roots.get(dst)?;
        if let Some(object) = value {
            self.increment(object)?;
        }
        self.replace_root(dst, value)
    }

    fn clear(&mut self, var: Var) -> Result<()> {
        self.replace_root(var, None)
    }

    fn read_field(&mut self, dst: Var, src: Var, offset: CellOffset) -> Result<()> {
        self.base.roots.get(dst)?;
        let value = self.base.load_reference(self.base.deref(src)?, offset)?;
        if let Some(object) = value {
            self.increment(object)?;
        }
        self.replace_root(dst, value)
    }

    fn write_field(&mut self, target: Var, offset: CellOffset, src: Var) -> Result<()> {
        let object = self.base.deref(target)?;
        let value = self.base.roots.get(src)?;
        let old = self.base.load_reference(object, offset)?;
        // Count the new reference first: the old and new values may be the same object.
        if let Some(new) = value {
            self.increment(new)?;
        }
        header::store_field(
            &mut self.base.memory,
            object,
            offset,
            ObjectReference::word_of(value),
        )?;
        match old {
            Some(old) => self.decrement(old),
            None => Ok(()),
        }
    }

    fn end_scope(&mut self) -> Result<()> {
        for object in self.base.roots.end_scope()? {
            self.decrement(object)?;
        }
        Ok(())
    }

    /// Besides the reachable graph, check every object in the heap: its count must equal the
    /// number of roots and fields referring to it. Fields of leaked cycles count too.
    fn sanity_check(&self) -> Result<SanityReport> {
        let report = SanityChecker::new().check(&self.base)?;
        let objects = self.heap_objects()?;
        let mut incoming: HashMap<ObjectReference, Word> = HashMap::new();
        for root in self.base.roots.roots() {
            *incoming.entry(root).or_default() += 1;
        }
        for object in objects.iter() {
            for child in header::children(&self.base.memory, *object)? {
                *incoming.entry(child).or_default() += 1;
            }
        }
        for object in objects {
            assert_eq!(
                self.reference_count(object)?,
                incoming.get(&object).copied().unwrap_or(0),
                "reference count of {} does not match its incoming references",
                object
            );
        }
        Ok(report)
    }
}

impl<R: RootSet> RefCount<R> {
    pub fn new(options: Options, roots: R) -> Self {
        RefCount {
            base: BasePlan::new(options, roots),
        }
    }

    /// Every object in the heap, found by stepping over free ranges and object headers.
    pub fn heap_objects(&self) -> Result<Vec<ObjectReference>> {
        let memory = &self.base.memory;
        let end = Address::from_usize(memory.capacity());
        let mut free = self.base.free_list.ranges().peekable();
        let mut objects = vec![];
        let mut cursor = Address::ZERO;
        while cursor < end {
            if let Some((start, len)) = free.next_if(|(start, _)| *start == cursor) {
                cursor = start + len;
                continue;
            }
            let limit = free.peek().map_or(end, |(start, _)| *start);
            for object in ObjectIterator::new(memory, cursor, limit) {
                objects.push(object?);
            }
            cursor = limit;
        }
        Ok(objects)
    }

    pub fn reference_count(&self, object: ObjectReference) -> Result<Word> {
        header::load_aux(&self.base.memory, object)
    }

    /// Point `var` at `value`, and drop the reference `var` held before. The caller has already
    /// counted the reference to `value`.
    fn replace_root(&mut self, var: Var, value: Option<ObjectReference>) -> Result<()> {
        let old = self.base.roots.get(var)?;
        self.base.roots.set(var, value)?;
        match old {
            Some(old) => self.decrement(old),
            None => Ok(()),
        }
    }

    fn increment(&mut self, object: ObjectReference) -> Result<()> {
        let count = self.reference_count(object)?;
        trace!("inc {} -> {}", object, count + 1);
        header::store_aux(&mut self.base.memory, object, count + 1)
    }

    /// Drop one reference to `object`. An object whose count reaches zero is released, and the
    /// references it holds are dropped in turn. Objects are released in the order they die,
    /// parents before children, fields in order.
    fn decrement(&mut self, object: ObjectReference) -> Result<()> {
        let mut worklist = vec![object];
        while let Some(object) = worklist.pop() {
            let count = self.reference_count(object)?;
            if count <= 0 {
                // Already released: the heap is corrupt or the reference is stale.
                return Err(GcError::InvalidAddress {
                    address: object.to_word(),
                });
            }
            header::store_aux(&mut self.base.memory, object, count - 1)?;
            trace!("dec {} -> {}", object, count - 1);
            if count == 1 {
                let children = header::children(&self.base.memory, object)?;
                self.base.release(object)?;
                worklist.extend(children.into_iter().rev());
            }
        }
        Ok(())
    }
}
