//! # Poset Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion benchmarks for the consensus pipeline
//! └── integration/      # Multi-node flows: gossip, reset, bootstrap
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p hg-tests
//!
//! # By category
//! cargo test -p hg-tests integration::
//!
//! # Benchmarks
//! cargo bench -p hg-tests
//! ```

pub mod benchmarks;
pub mod integration;
