//! Root discovery: which Vars are live, and what they point to.
//!
//! Plans never track variables themselves. They go through a [`RootSet`], so how a runtime binds
//! variables to scopes is independent of the collection strategy. [`ScopeStack`] is the
//! implementation used by default: lexically nested scopes, each owning the Vars declared in it.

use std::fmt;

use crate::util::address::ObjectReference;
use crate::util::error::{GcError, Result};

/// A handle to a variable declared in a [`RootSet`]. A `Var` is either null or bound to an
/// object; its value lives in the root set, so a moving collector can update it.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    index: usize,
    id: u64,
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Var#{}", self.id)
    }
}

/// Callback for [`RootSet::scan_roots`]. The visitor may update the root in place.
pub trait RootVisitor {
    fn visit_root(&mut self, root: &mut Option<ObjectReference>) -> Result<()>;
}

/// This lets us use closures as RootVisitor.
impl<F: FnMut(&mut Option<ObjectReference>) -> Result<()>> RootVisitor for F {
    fn visit_root(&mut self, root: &mut Option<ObjectReference>) -> Result<()> {
        self(root)
    }
}

pub trait RootSet {
    /// Open a new innermost scope.
    fn begin_scope(&mut self);

    /// Close the innermost scope. Its Vars stop being roots, and their non-null values are
    /// returned in declaration order.
    fn end_scope(&mut self) -> Result<Vec<ObjectReference>>;

    /// Declare a new null Var in the innermost scope.
    fn declare(&mut self) -> Result<Var>;

    fn get(&self, var: Var) -> Result<Option<ObjectReference>>;

    fn set(&mut self, var: Var, value: Option<ObjectReference>) -> Result<()>;

    /// The non-null values of all Vars in all open scopes, outermost scope first.
    fn roots(&self) -> Vec<ObjectReference>;

    /// Visit every Var in every open scope, null ones included, outermost scope first.
    /// Stops at the first error the visitor returns.
    fn scan_roots(&mut self, visitor: &mut dyn RootVisitor) -> Result<()>;

    /// The number of open scopes.
    fn depth(&self) -> usize;
}

#[derive(Debug)]
struct Slot {
    id: u64,
    value: Option<ObjectReference>,
}

/// A stack of scopes. Vars of a scope are contiguous in `slots`, starting at the index recorded
/// in `frames` when the scope was opened. A new `ScopeStack` has one (outermost) scope open.
#[derive(Debug)]
pub struct ScopeStack {
    slots: Vec<Slot>,
    frames: Vec<usize>,
    next_id: u64,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            slots: vec![],
            frames: vec![0],
            next_id: 0,
        }
    }

    fn slot(&self, var: Var) -> Result<&Slot> {
        self.slots
            .get(var.index)
            .filter(|slot| slot.id == var.id)
            .ok_or(GcError::UnknownVar(var))
    }

    fn slot_mut(&mut self, var: Var) -> Result<&mut Slot> {
        self.slots
            .get_mut(var.index)
            .filter(|slot| slot.id == var.id)
            .ok_or(GcError::UnknownVar(var))
    }
}

impl RootSet for ScopeStack {
    fn begin_scope(&mut self) {
        self.frames.push(self.slots.len());
        trace!("begin scope {}", self.frames.len());
    }

    fn end_scope(&mut self) -> Result<Vec<ObjectReference>> {
        let start = self.frames.pop().ok_or(GcError::NoOpenScope)?;
        trace!("end scope {}", self.frames.len() + 1);
        Ok(self
            .slots
            .drain(start..)
            .filter_map(|slot| slot.value)
            .collect())
    }

    fn declare(&mut self) -> Result<Var> {
        if self.frames.is_empty() {
            return Err(GcError::NoOpenScope);
        }
        let var = Var {
            index: self.slots.len(),
            id: self.next_id,
        };
        self.next_id += 1;
        self.slots.push(Slot {
            id: var.id,
            value: None,
        });
        Ok(var)
    }

    fn get(&self, var: Var) -> Result<Option<ObjectReference>> {
        self.slot(var).map(|slot| slot.value)
    }

    fn set(&mut self, var: Var, value: Option<ObjectReference>) -> Result<()> {
        self.slot_mut(var)?.value = value;
        Ok(())
    }

    fn roots(&self) -> Vec<ObjectReference> {
        self.slots.iter().filter_map(|slot| slot.value).collect()
    }

    fn scan_roots(&mut self, visitor: &mut dyn RootVisitor) -> Result<()> {
        for slot in self.slots.iter_mut() {
            visitor.visit_root(&mut slot.value)?;
        }
        Ok(())
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }
}
