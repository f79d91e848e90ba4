//! Behaviour every plan shares, checked against all of them.

use cellgc::memory_manager;
use cellgc::util::sanity::HeapSnapshot;
use cellgc::{GcError, Options, Plan, PlanSelector, ScopeStack};
use strum::IntoEnumIterator;

type BoxedPlan = Box<dyn Plan<Roots = ScopeStack>>;

fn create(plan: PlanSelector, heap_size: usize) -> BoxedPlan {
    let mut options = Options::with_plan(plan, heap_size);
    options.sanity = true;
    memory_manager::create_plan(options)
}

fn snapshot(plan: &BoxedPlan) -> HeapSnapshot {
    HeapSnapshot::take(plan.base()).unwrap()
}

#[test]
fn create_plan_honors_selector() {
    for selector in PlanSelector::iter() {
        let plan = create(selector, 64);
        assert_eq!(plan.constraints().name, selector.to_string());
        assert_eq!(plan.base().memory.capacity(), 64);
    }
}

#[test]
fn new_objects_have_null_fields() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let a = plan.declare().unwrap();
        plan.alloc(a, 3).unwrap();
        assert_eq!(plan.object_size(a), Ok(3));
        for i in 0..3 {
            assert_eq!(plan.load_field(a, i), Ok(None), "{}", selector);
        }
    }
}

#[test]
fn collection_preserves_reachable_graph() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 128);
        let a = plan.declare().unwrap();
        let b = plan.declare().unwrap();
        let t = plan.declare().unwrap();

        // a -> [x, y], x -> y, y -> a; b aliases y.
        plan.alloc(a, 2).unwrap();
        plan.alloc(t, 1).unwrap();
        plan.write_field(a, 0, t).unwrap();
        plan.alloc(b, 1).unwrap();
        plan.write_field(a, 1, b).unwrap();
        plan.write_field(t, 0, b).unwrap();
        plan.write_field(b, 0, a).unwrap();
        // Garbage.
        plan.alloc(t, 4).unwrap();
        plan.clear(t).unwrap();

        let before = snapshot(&plan);
        plan.collect().unwrap();
        assert_eq!(snapshot(&plan), before, "{}", selector);
        plan.sanity_check().unwrap();

        // b still aliases a.fields[1].
        assert_eq!(plan.load_field(a, 1).unwrap(), plan.get(b).unwrap());
    }
}

#[test]
fn read_field_follows_references() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let a = plan.declare().unwrap();
        let b = plan.declare().unwrap();
        let c = plan.declare().unwrap();
        plan.alloc(a, 1).unwrap();
        let child = plan.alloc(b, 0).unwrap();
        plan.write_field(a, 0, b).unwrap();
        plan.read_field(c, a, 0).unwrap();
        assert_eq!(plan.get(c), Ok(Some(child)));
        plan.sanity_check().unwrap();
    }
}

#[test]
fn null_and_out_of_bounds_accesses_are_rejected() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let a = plan.declare().unwrap();
        let b = plan.declare().unwrap();
        assert_eq!(plan.read_field(b, a, 0), Err(GcError::NullReference(a)));
        assert_eq!(plan.write_field(a, 0, b), Err(GcError::NullReference(a)));

        let object = plan.alloc(a, 1).unwrap();
        assert_eq!(
            plan.write_field(a, 1, b),
            Err(GcError::FieldOutOfBounds {
                object,
                offset: 1,
                size: 1
            })
        );
        // Writing a null Var into a field stores null.
        plan.write_field(a, 0, b).unwrap();
        assert_eq!(plan.load_field(a, 0), Ok(None));
    }
}

#[test]
fn closed_scope_vars_are_stale() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let outer = plan.declare().unwrap();
        plan.begin_scope();
        let inner = plan.declare().unwrap();
        plan.alloc(inner, 1).unwrap();
        plan.end_scope().unwrap();
        assert_eq!(plan.assign(outer, inner), Err(GcError::UnknownVar(inner)));
        assert_eq!(plan.alloc(inner, 1), Err(GcError::UnknownVar(inner)));
        // Closing the outermost scope leaves nowhere to declare.
        plan.end_scope().unwrap();
        assert_eq!(plan.declare(), Err(GcError::NoOpenScope));
        assert_eq!(plan.end_scope(), Err(GcError::NoOpenScope));
    }
}

#[test]
fn closed_scope_objects_are_reclaimed() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let keep = plan.declare().unwrap();
        plan.alloc(keep, 1).unwrap();
        plan.begin_scope();
        let temp = plan.declare().unwrap();
        plan.alloc(temp, 2).unwrap();
        plan.end_scope().unwrap();
        plan.collect().unwrap();
        assert_eq!(plan.stats().objects_reclaimed, 1, "{}", selector);
        assert_eq!(plan.stats().cells_reclaimed, 4, "{}", selector);
        assert_eq!(plan.sanity_check().unwrap().live_objects, 1);
    }
}

#[test]
fn unreachable_cycle_divides_the_plans() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let a = plan.declare().unwrap();
        let b = plan.declare().unwrap();
        plan.alloc(a, 1).unwrap();
        plan.alloc(b, 1).unwrap();
        plan.write_field(a, 0, b).unwrap();
        plan.write_field(b, 0, a).unwrap();
        plan.clear(a).unwrap();
        plan.clear(b).unwrap();
        plan.collect().unwrap();

        let reclaimed = plan.stats().objects_reclaimed;
        if plan.constraints().reclaims_cycles {
            assert_eq!(reclaimed, 2, "{}", selector);
        } else {
            assert_eq!(selector, PlanSelector::RefCount);
            assert_eq!(reclaimed, 0);
        }
    }
}

#[test]
fn allocation_larger_than_the_heap_fails() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let a = plan.declare().unwrap();
        let b = plan.declare().unwrap();
        let object = plan.alloc(a, 4).unwrap();
        let before = snapshot(&plan);

        assert_eq!(
            plan.alloc(b, 64),
            Err(GcError::OutOfMemory { requested: 66 }),
            "{}",
            selector
        );
        assert_eq!(plan.get(b), Ok(None));
        assert_eq!(snapshot(&plan), before);
        // The failed allocation may have moved `a`, but nothing else.
        if !plan.constraints().moves_objects {
            assert_eq!(plan.get(a), Ok(Some(object)));
        }
        assert_eq!(plan.stats().objects_allocated, 1);
        // Only plans that reclaim in batches collect before giving up.
        let expected_collections = usize::from(plan.constraints().needs_collection);
        assert_eq!(plan.stats().collections, expected_collections, "{}", selector);
    }
}

#[test]
fn allocation_size_overflowing_the_header_fails() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let a = plan.declare().unwrap();
        let b = plan.declare().unwrap();
        plan.alloc(a, 2).unwrap();
        let before = snapshot(&plan);
        let stats = plan.stats().clone();

        assert!(
            matches!(
                plan.alloc(b, usize::MAX - 1),
                Err(GcError::OutOfMemory { .. })
            ),
            "{}",
            selector
        );
        assert_eq!(plan.get(b), Ok(None));
        assert_eq!(snapshot(&plan), before);
        assert_eq!(plan.stats(), &stats);
    }
}

#[test]
fn exhausted_heap_recovers_garbage() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let a = plan.declare().unwrap();
        // Each object is garbage as soon as the next one is allocated.
        for _ in 0..100 {
            plan.clear(a).unwrap();
            plan.alloc(a, 6).unwrap();
        }
        // Tracing plans only account for garbage when they collect it.
        plan.collect().unwrap();
        assert_eq!(plan.stats().objects_allocated, 100);
        assert_eq!(plan.stats().objects_reclaimed, 99, "{}", selector);
        assert_eq!(plan.sanity_check().unwrap().live_objects, 1);
    }
}

#[test]
fn take_reclaimed_is_empty_unless_recording() {
    for selector in PlanSelector::iter() {
        let mut plan = create(selector, 64);
        let a = plan.declare().unwrap();
        plan.alloc(a, 1).unwrap();
        plan.clear(a).unwrap();
        plan.collect().unwrap();
        assert_eq!(plan.stats().objects_reclaimed, 1);
        assert!(plan.take_reclaimed().is_empty());
    }
}
