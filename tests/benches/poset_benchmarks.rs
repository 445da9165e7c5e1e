//! # Poset Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | poset-pipeline | insert + one consensus pass over round-robin gossip |
//! | poset-ancestry | memoized reachability on a 200-event DAG |
//! | poset-wire | wire encoding and parent resolution |

use criterion::{criterion_group, criterion_main, Criterion};

fn poset_benches(c: &mut Criterion) {
    hg_tests::benchmarks::poset::register_benchmarks(c);
}

criterion_group!(benches, poset_benches);
criterion_main!(benches);
