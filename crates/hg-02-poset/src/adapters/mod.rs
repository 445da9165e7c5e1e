//! Adapters layer (Hexagonal Architecture)

mod inmem_store;

pub use inmem_store::InmemStore;
