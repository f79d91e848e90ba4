use cellgc::plan::semispace::SemiSpace;
use cellgc::util::sanity::HeapSnapshot;
use cellgc::{GcError, Options, Plan, PlanSelector, ScopeStack};

fn semispace(heap_size: usize) -> SemiSpace<ScopeStack> {
    let mut options = Options::with_plan(PlanSelector::SemiSpace, heap_size);
    options.sanity = true;
    SemiSpace::new(options, ScopeStack::new())
}

#[test]
fn field_keeps_object_alive_across_collection() {
    // Two 10-cell regions.
    let mut ss = semispace(20);
    let a = ss.declare().unwrap();
    let b = ss.declare().unwrap();
    let t = ss.declare().unwrap();

    ss.alloc(a, 2).unwrap();
    ss.alloc(b, 2).unwrap();
    ss.write_field(b, 0, a).unwrap();
    ss.clear(a).unwrap();

    // Allocate garbage until a collection fires.
    let mut allocations = 0;
    while ss.stats().collections == 0 {
        ss.clear(t).unwrap();
        ss.alloc(t, 0).unwrap();
        allocations += 1;
        assert!(allocations < 10);
    }
    assert_eq!(allocations, 2);

    let object_a = ss.load_field(b, 0).unwrap().unwrap();
    assert!(ss.tospace().contains(object_a));
    assert_eq!(ss.base.memory.capacity(), 20);
    assert_eq!(ss.stats().objects_copied, 2);
    assert_eq!(ss.stats().objects_reclaimed, 1);
    let report = ss.sanity_check().unwrap();
    assert!(report.is_live(object_a));
    assert_eq!(report.live_objects, 3);
}

#[test]
fn live_data_larger_than_a_region_fails() {
    let mut ss = semispace(20);
    let a = ss.declare().unwrap();
    let b = ss.declare().unwrap();
    ss.alloc(a, 4).unwrap();
    let before = HeapSnapshot::take(&ss.base).unwrap();

    // 6 + 6 cells do not fit in a 10-cell region, even after `a` is compacted.
    assert_eq!(ss.alloc(b, 4), Err(GcError::OutOfMemory { requested: 6 }));
    assert_eq!(ss.get(b), Ok(None));
    assert_eq!(ss.stats().collections, 1);
    assert_eq!(HeapSnapshot::take(&ss.base).unwrap(), before);
}

#[test]
fn aliased_roots_share_the_copy() {
    let mut ss = semispace(64);
    let a = ss.declare().unwrap();
    let b = ss.declare().unwrap();
    let old = ss.alloc(a, 3).unwrap();
    ss.assign(b, a).unwrap();

    ss.collect().unwrap();
    let new = ss.get(a).unwrap().unwrap();
    assert_ne!(new, old);
    assert_eq!(ss.get(b), Ok(Some(new)));
    assert_eq!(ss.stats().objects_copied, 1);
}

#[test]
fn cycle_is_copied_once_per_object() {
    let mut ss = semispace(64);
    let a = ss.declare().unwrap();
    let b = ss.declare().unwrap();
    ss.alloc(a, 1).unwrap();
    ss.alloc(b, 1).unwrap();
    ss.write_field(a, 0, b).unwrap();
    ss.write_field(b, 0, a).unwrap();

    ss.collect().unwrap();
    assert_eq!(ss.stats().objects_copied, 2);
    let new_a = ss.get(a).unwrap();
    let new_b = ss.get(b).unwrap();
    assert_eq!(ss.load_field(a, 0), Ok(new_b));
    assert_eq!(ss.load_field(b, 0), Ok(new_a));
}

#[test]
fn regions_alternate() {
    let mut ss = semispace(64);
    let a = ss.declare().unwrap();
    ss.alloc(a, 1).unwrap();
    assert!(!ss.hi);
    let first = ss.tospace().name();

    ss.collect().unwrap();
    assert!(ss.hi);
    assert_ne!(ss.tospace().name(), first);
    assert!(ss.tospace().contains(ss.get(a).unwrap().unwrap()));
    assert_eq!(ss.fromspace().used_cells(), 0);
    assert!(!ss.fromspace().is_from_space());
    assert!(!ss.tospace().is_from_space());

    ss.collect().unwrap();
    assert!(!ss.hi);
    assert_eq!(ss.tospace().name(), first);
    assert_eq!(ss.tospace().used_cells(), 3);
    assert_eq!(ss.stats().collections, 2);
}

#[test]
fn copies_are_compacted() {
    let mut ss = semispace(64);
    let vars: Vec<_> = (0..4).map(|_| ss.declare().unwrap()).collect();
    for var in vars.iter() {
        ss.alloc(*var, 2).unwrap();
    }
    ss.clear(vars[0]).unwrap();
    ss.clear(vars[2]).unwrap();
    ss.collect().unwrap();
    assert_eq!(ss.tospace().used_cells(), 8);
    assert_eq!(ss.stats().cells_reclaimed, 8);
}
