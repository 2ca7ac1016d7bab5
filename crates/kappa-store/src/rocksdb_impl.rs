//! RocksDB implementation of the [`StorageBackend`] trait.
//!
//! Partitions map to column families. The metadata store uses a fixed set of
//! partitions, so all column families are declared when the database is
//! opened; there is no runtime partition creation.

use crate::storage_trait::{KvIterator, Operation, Partition, Result, StorageBackend, StorageError};
use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, ReadOptions, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

/// RocksDB-backed storage.
pub struct RocksDbBackend {
    db: Arc<DB>,
}

impl RocksDbBackend {
    /// Opens (or creates) a database at `path` with the given partitions.
    pub fn open(path: &Path, partitions: &[&str]) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, path, partitions)
            .map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, partition: &Partition) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))
    }
}

impl StorageBackend for RocksDbBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(partition)?;
        self.db
            .get_cf(cf, key)
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf(partition)?;
        self.db
            .put_cf(cf, key, value)
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let cf = self.cf(partition)?;
        self.db
            .delete_cf(cf, key)
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        let mut batch = WriteBatch::default();

        for op in operations {
            match op {
                Operation::Put {
                    partition,
                    key,
                    value,
                } => {
                    let cf = self.cf(&partition)?;
                    batch.put_cf(cf, key, value);
                }
                Operation::Delete { partition, key } => {
                    let cf = self.cf(&partition)?;
                    batch.delete_cf(cf, key);
                }
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    fn scan(&self, partition: &Partition, prefix: Option<&[u8]>) -> Result<KvIterator<'_>> {
        let cf = self.cf(partition)?;

        // Hold a snapshot for the lifetime of the iterator so the consumer
        // sees a consistent view even if writers commit concurrently.
        let snapshot = self.db.snapshot();
        let mut readopts = ReadOptions::default();
        readopts.set_snapshot(&snapshot);

        let prefix = prefix.map(|p| p.to_vec());
        let mode = match &prefix {
            Some(p) => IteratorMode::From(p.as_slice(), Direction::Forward),
            None => IteratorMode::Start,
        };
        let inner = self.db.iterator_cf_opt(cf, readopts, mode);

        struct SnapshotIter<'a, D: rocksdb::DBAccess> {
            _snapshot: rocksdb::SnapshotWithThreadMode<'a, D>,
            inner: rocksdb::DBIteratorWithThreadMode<'a, D>,
            prefix: Option<Vec<u8>>,
        }

        impl<'a, D: rocksdb::DBAccess> Iterator for SnapshotIter<'a, D> {
            type Item = (Vec<u8>, Vec<u8>);

            fn next(&mut self) -> Option<Self::Item> {
                let (key, value) = self.inner.next()?.ok()?;
                if let Some(prefix) = &self.prefix {
                    // Keys are ordered, so the first non-matching key ends the scan.
                    if !key.starts_with(prefix) {
                        return None;
                    }
                }
                Some((key.into_vec(), value.into_vec()))
            }
        }

        Ok(Box::new(SnapshotIter {
            _snapshot: snapshot,
            inner,
            prefix,
        }))
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.db.cf_handle(partition.name()).is_some()
    }
}
