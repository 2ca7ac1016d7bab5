//! Backend-agnostic storage operations.
//!
//! The metadata store only needs a handful of primitives: point reads and
//! writes, atomic batches, and ordered prefix scans. Backends map the
//! [`Partition`] concept to whatever their native grouping is (RocksDB uses a
//! column family per partition, the in-memory backend a map per partition).
//!
//! Scans return a lazy iterator backed by a consistent snapshot, which is the
//! read-transaction analog: the consumer holds the snapshot for as long as it
//! holds the iterator.

use std::fmt;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Lazy key/value iterator returned by [`StorageBackend::scan`].
pub type KvIterator<'a> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Partition (column family) not found
    PartitionNotFound(String),

    /// Generic I/O error from the underlying engine
    Io(String),

    /// Malformed stored bytes
    Corrupt(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::PartitionNotFound(p) => write!(f, "partition not found: {}", p),
            StorageError::Io(msg) => write!(f, "I/O error: {}", msg),
            StorageError::Corrupt(msg) => write!(f, "corrupt record: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// A logical partition of data within a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    name: String,
}

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Partition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A single operation in an atomic batch.
#[derive(Debug, Clone)]
pub enum Operation {
    Put {
        partition: Partition,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        partition: Partition,
        key: Vec<u8>,
    },
}

/// Trait for pluggable storage backend implementations.
///
/// Implementations must be thread-safe; stores share a single backend handle
/// across connections and every method opens its own read or write scope.
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key. `Ok(None)` if the key does not exist.
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Stores a key/value pair, overwriting any existing value.
    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()>;

    /// Deletes a key. Idempotent.
    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()>;

    /// Applies all operations atomically; either all succeed or none do.
    fn batch(&self, operations: Vec<Operation>) -> Result<()>;

    /// Scans keys in ascending order, optionally restricted to a prefix.
    ///
    /// The iterator observes a consistent snapshot taken at call time; writes
    /// committed while the iterator is alive are not visible through it.
    fn scan(&self, partition: &Partition, prefix: Option<&[u8]>) -> Result<KvIterator<'_>>;

    /// Checks whether a partition exists.
    fn partition_exists(&self, partition: &Partition) -> bool;
}
