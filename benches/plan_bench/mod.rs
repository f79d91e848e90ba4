pub mod alloc;
pub mod collect;

pub use criterion::Criterion;

pub fn bench(c: &mut Criterion) {
    alloc::bench(c);
    collect::bench(c);
}
