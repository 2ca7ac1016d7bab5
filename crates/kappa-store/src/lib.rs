//! Storage backend abstraction for the Kappa metadata store.
//!
//! All durable state lives behind the [`StorageBackend`] trait: a small set
//! of key/value operations over named partitions, with atomic multi-operation
//! batches and snapshot-consistent scans. The production backend maps
//! partitions to RocksDB column families; an in-memory backend backs tests.

pub mod memory;
pub mod rocksdb_impl;
pub mod storage_trait;

pub use memory::InMemoryBackend;
pub use rocksdb_impl::RocksDbBackend;
pub use storage_trait::{KvIterator, Operation, Partition, Result, StorageBackend, StorageError};
