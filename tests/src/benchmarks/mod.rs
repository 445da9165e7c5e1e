//! # Poset Benchmarks
//!
//! Throughput of the consensus pipeline on round-robin gossip DAGs.

pub mod poset;
