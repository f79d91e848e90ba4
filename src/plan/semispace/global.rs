use crate::plan::global::BasePlan;
use crate::plan::Plan;
use crate::plan::PlanConstraints;
use crate::policy::copyspace::CopySpace;
use crate::util::address::{Address, CellOffset, ObjectReference};
use crate::util::constants::NULL_WORD;
use crate::util::error::Result;
use crate::util::header;
use crate::util::options::Options;
use crate::util::sanity::{SanityChecker, SanityReport};
use crate::vm::RootSet;

/// Semi-space collection: the heap is split into two equal regions. Objects are bump-allocated
/// in the to-space. A collection copies everything reachable into the other region, which
/// then becomes the to-space, and abandons the old one wholesale.
pub struct SemiSpace<R: RootSet> {
    /// Which copyspace is the to-space: `copyspace1` if set.
    pub hi: bool,
    pub copyspace0: CopySpace,
    pub copyspace1: CopySpace,
    pub base: BasePlan<R>,
}

pub const SS_CONSTRAINTS: PlanConstraints = PlanConstraints {
    name: "SemiSpace",
    moves_objects: true,
    ..PlanConstraints::default()
};

impl<R: RootSet> Plan for SemiSpace<R> {
    type Roots = R;

    fn constraints(&self) -> &'static PlanConstraints {
        &SS_CONSTRAINTS
    }

    fn base(&self) -> &BasePlan<R> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BasePlan<R> {
        &mut self.base
    }

    fn alloc_once(&mut self, size: CellOffset) -> Result<Option<ObjectReference>> {
        let SemiSpace {
            hi,
            copyspace0,
            copyspace1,
            base,
        } = self;
        let tospace = if *hi { copyspace1 } else { copyspace0 };
        tospace.alloc(&mut base.memory, size)
    }

    fn collect(&mut self) -> Result<()> {
        self.prepare();

        let SemiSpace {
            hi,
            copyspace0,
            copyspace1,
            base,
        } = self;
        let tospace = if *hi { copyspace1 } else { copyspace0 };
        let BasePlan {
            memory,
            roots,
            stats,
            ..
        } = base;
        let mut copied = 0;
        roots.scan_roots(&mut |root: &mut Option<ObjectReference>| -> Result<()> {
            if let Some(object) = *root {
                *root = Some(tospace.trace_object(memory, object, &mut copied)?);
            }
            Ok(())
        })?;
        stats.objects_copied += copied;

        self.release()?;
        self.base.stats.collections += 1;
        info!(
            "[GC {}] SemiSpace: copied {} objects ({} cells) into {}",
            self.base.stats.collections,
            copied,
            self.tospace().used_cells(),
            self.tospace().name()
        );
        self.sanity_check_after_gc()
    }

    fn sanity_check(&self) -> Result<SanityReport> {
        let report = SanityChecker::new().check(&self.base)?;
        // Both regions are released from their from-space role once a collection ends.
        assert!(
            !self.copyspace0.is_from_space() && !self.copyspace1.is_from_space(),
            "a copyspace is still the from-space outside a collection"
        );
        for object in report.live() {
            assert!(
                self.tospace().contains(object),
                "live object {} is outside the to-space {}",
                object,
                self.tospace().name()
            );
            assert_eq!(
                header::load_aux(&self.base.memory, object)?,
                NULL_WORD,
                "live object {} has a stale forwarding pointer",
                object
            );
        }
        Ok(report)
    }
}

impl<R: RootSet> SemiSpace<R> {
    pub fn new(options: Options, roots: R) -> Self {
        let half = options.heap_size / 2;
        SemiSpace {
            hi: false,
            copyspace0: CopySpace::new("copyspace0", Address::ZERO, half, false),
            copyspace1: CopySpace::new("copyspace1", Address::from_usize(half), half, false),
            base: BasePlan::new(options, roots),
        }
    }

    pub fn tospace(&self) -> &CopySpace {
        if self.hi {
            &self.copyspace1
        } else {
            &self.copyspace0
        }
    }

    pub fn fromspace(&self) -> &CopySpace {
        if self.hi {
            &self.copyspace0
        } else {
            &self.copyspace1
        }
    }

    /// Flip the semi-spaces. The old to-space becomes the from-space of this collection, and
    /// copies go to the start of the other region.
    fn prepare(&mut self) {
        self.hi = !self.hi;
        let hi = self.hi;
        self.copyspace0.prepare(hi);
        self.copyspace1.prepare(!hi);
        trace!(
            "SemiSpace prepare: copying from {} into {}",
            self.fromspace().name(),
            self.tospace().name()
        );
    }

    /// Account for the objects left behind in the from-space, then release it.
    fn release(&mut self) -> Result<()> {
        debug_assert!(self.fromspace().is_from_space());
        let mut dead = vec![];
        for object in self.fromspace().objects(&self.base.memory) {
            let object = object?;
            if CopySpace::forwarding_pointer(&self.base.memory, object)?.is_none() {
                dead.push((object, header::load_size(&self.base.memory, object)?));
            }
        }
        for (object, size) in dead {
            self.base.record_reclaimed(object, size)?;
        }
        for space in [&mut self.copyspace0, &mut self.copyspace1] {
            if space.is_from_space() {
                space.release();
            }
        }
        Ok(())
    }
}
