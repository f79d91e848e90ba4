use criterion::{black_box, Criterion};

use cellgc::{Options, Plan, PlanSelector};

/// Objects in the linked list that survives each collection.
const LIVE: usize = 1000;

/// Collect a heap holding a linked list and as much garbage.
pub fn bench(c: &mut Criterion) {
    for selector in [PlanSelector::SemiSpace, PlanSelector::MarkSweep] {
        let mut plan = cellgc::plan::create_plan(Options::with_plan(selector, 1 << 16));
        let head = plan.declare().unwrap();
        let node = plan.declare().unwrap();
        let garbage = plan.declare().unwrap();
        for _ in 0..LIVE {
            plan.alloc(node, 2).unwrap();
            plan.write_field(node, 0, head).unwrap();
            plan.assign(head, node).unwrap();
            plan.alloc(garbage, 2).unwrap();
        }
        plan.clear(node).unwrap();
        plan.clear(garbage).unwrap();

        c.bench_function(&format!("collect_{}", selector), |b| {
            b.iter(|| {
                plan.collect().unwrap();
                black_box(plan.stats().collections);
            })
        });
    }
}
