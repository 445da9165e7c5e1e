//! # Poset Pipeline Benchmarks
//!
//! - Full pipeline: insert N round-robin events, then one consensus pass
//! - Ancestry: memoized `ancestor` / `strongly_see` across a deep DAG
//! - Wire: encode, decode and resolve one event

use criterion::{black_box, BatchSize, BenchmarkId, Criterion, Throughput};
use hg_02_poset::test_utils::TestDag;
use hg_02_poset::WireEvent;
use std::time::Duration;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap_or_else(|e| panic!("benchmark runtime: {e}"))
}

pub fn bench_pipeline(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("poset-pipeline");
    group.measurement_time(Duration::from_secs(10));

    for (participants, events) in [(3, 60), (4, 120), (7, 210)] {
        group.throughput(Throughput::Elements(events as u64));
        group.bench_with_input(
            BenchmarkId::new(format!("n{participants}"), events),
            &events,
            |b, &events| {
                b.iter_batched(
                    || TestDag::new(participants),
                    |mut dag| {
                        dag.gossip(events).unwrap();
                        rt.block_on(dag.poset.run_consensus_pass()).unwrap();
                        black_box(dag.poset.last_consensus_round())
                    },
                    BatchSize::LargeInput,
                )
            },
        );
    }
    group.finish();
}

pub fn bench_ancestry(c: &mut Criterion) {
    let mut group = c.benchmark_group("poset-ancestry");

    let mut dag = TestDag::new(4);
    dag.gossip(200).unwrap();
    let tip = dag.hash("g199");
    let base = dag.hash("g0");

    group.bench_function("ancestor_deep", |b| {
        b.iter(|| black_box(dag.poset.ancestor(&tip, &base).unwrap()))
    });
    group.bench_function("strongly_see_deep", |b| {
        b.iter(|| black_box(dag.poset.strongly_see(&tip, &base).unwrap()))
    });
    group.finish();
}

pub fn bench_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("poset-wire");

    let mut dag = TestDag::new(4);
    dag.gossip(20).unwrap();
    let event = dag.event("g19");
    let bytes = event.to_wire().unwrap().encode().unwrap();

    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| black_box(event.to_wire().unwrap().encode().unwrap()))
    });
    group.bench_function("decode_and_resolve", |b| {
        b.iter(|| {
            let wire = WireEvent::decode(black_box(&bytes)).unwrap();
            black_box(dag.poset.read_wire_info(&wire).unwrap())
        })
    });
    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_pipeline(c);
    bench_ancestry(c);
    bench_wire(c);
}
