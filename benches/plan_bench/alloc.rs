use criterion::{black_box, Criterion};
use strum::IntoEnumIterator;

use cellgc::{Options, Plan, PlanSelector};

/// Allocate short-lived objects into one Var, so every plan reclaims as it goes.
pub fn bench(c: &mut Criterion) {
    for selector in PlanSelector::iter() {
        let mut plan = cellgc::plan::create_plan(Options::with_plan(selector, 1 << 16));
        let var = plan.declare().unwrap();
        c.bench_function(&format!("alloc_{}", selector), |b| {
            b.iter(|| {
                black_box(plan.alloc(var, 4).unwrap());
            })
        });
    }
}
