//! Heap verification.
//!
//! [`SanityChecker`] walks the object graph from the roots and checks that every reference leads
//! to a well-formed object. It is run after each collection when the `sanity` option or feature
//! is on, and by tests. [`HeapSnapshot`] records the shape of the reachable graph independently
//! of addresses, so the graph can be compared across a moving collection.

use std::collections::{HashMap, HashSet};

use crate::plan::BasePlan;
use crate::util::address::{CellOffset, ObjectReference, Word};
use crate::util::error::Result;
use crate::util::header::{self, ObjectHeader};
use crate::vm::RootSet;

/// What the sanity checker found.
#[derive(Debug, Default)]
pub struct SanityReport {
    /// Objects reachable from the roots.
    pub live_objects: usize,
    /// Cells occupied by the reachable objects, headers included.
    pub live_cells: CellOffset,
    /// For each reachable object, the number of references to it: roots and fields.
    pub incoming: HashMap<ObjectReference, usize>,
}

impl SanityReport {
    pub fn is_live(&self, object: ObjectReference) -> bool {
        self.incoming.contains_key(&object)
    }

    pub fn live(&self) -> impl Iterator<Item = ObjectReference> + '_ {
        self.incoming.keys().copied()
    }
}

#[derive(Default)]
pub struct SanityChecker {
    /// Visited objects
    refs: HashSet<ObjectReference>,
}

impl SanityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the graph from the roots, validating each object header on the way.
    pub fn check<R: RootSet>(mut self, base: &BasePlan<R>) -> Result<SanityReport> {
        let mut report = SanityReport::default();
        let mut worklist = vec![];
        for root in base.roots.roots() {
            *report.incoming.entry(root).or_default() += 1;
            worklist.push(root);
        }
        while let Some(object) = worklist.pop() {
            if !self.refs.insert(object) {
                continue;
            }
            let h = ObjectHeader::load(&base.memory, object)?;
            report.live_objects += 1;
            report.live_cells += header::total_cells(h.size)?;
            for child in header::children(&base.memory, object)? {
                *report.incoming.entry(child).or_default() += 1;
                if !self.refs.contains(&child) {
                    worklist.push(child);
                }
            }
        }
        Ok(report)
    }
}

/// A data cell, with references replaced by the discovery index of their target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotCell {
    Raw(Word),
    Ref(usize),
}

/// The reachable graph, numbered in discovery order (roots in order, then breadth-first
/// in field order). Two snapshots are equal iff the graphs have the same shape, the same raw data
/// and the same aliasing, whatever the addresses of the objects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapSnapshot {
    /// The object index each non-null root points to.
    pub roots: Vec<usize>,
    /// The data cells of each object, by index.
    pub objects: Vec<Vec<SnapshotCell>>,
}

impl HeapSnapshot {
    pub fn take<R: RootSet>(base: &BasePlan<R>) -> Result<HeapSnapshot> {
        let mut ids: HashMap<ObjectReference, usize> = HashMap::new();
        let mut order: Vec<ObjectReference> = vec![];
        let discover = |object: ObjectReference,
                            ids: &mut HashMap<ObjectReference, usize>,
                            order: &mut Vec<ObjectReference>| {
            *ids.entry(object).or_insert_with(|| {
                order.push(object);
                order.len() - 1
            })
        };

        let roots = base
            .roots
            .roots()
            .into_iter()
            .map(|root| discover(root, &mut ids, &mut order))
            .collect();

        let mut objects = vec![];
        let mut next = 0;
        while next < order.len() {
            let object = order[next];
            let size = header::load_size(&base.memory, object)?;
            let mut cells = Vec::with_capacity(size);
            for i in 0..size {
                let word = header::load_field(&base.memory, object, i)?;
                cells.push(match ObjectReference::from_word(word) {
                    Some(child) => SnapshotCell::Ref(discover(child, &mut ids, &mut order)),
                    None => SnapshotCell::Raw(word),
                });
            }
            objects.push(cells);
            next += 1;
        }
        Ok(HeapSnapshot { roots, objects })
    }
}
