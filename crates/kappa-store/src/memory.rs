//! In-memory [`StorageBackend`] used by unit tests.
//!
//! Partitions are ordered maps behind a single lock. Scans clone the matching
//! range up front, which gives the same snapshot semantics as the RocksDB
//! backend at test-friendly sizes.

use crate::storage_trait::{KvIterator, Operation, Partition, Result, StorageBackend};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

type PartitionMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// Map-backed storage for tests.
#[derive(Default)]
pub struct InMemoryBackend {
    partitions: RwLock<HashMap<String, PartitionMap>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let partitions = self.partitions.read();
        Ok(partitions
            .get(partition.name())
            .and_then(|map| map.get(key).cloned()))
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let mut partitions = self.partitions.write();
        partitions
            .entry(partition.name().to_string())
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let mut partitions = self.partitions.write();
        if let Some(map) = partitions.get_mut(partition.name()) {
            map.remove(key);
        }
        Ok(())
    }

    fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        // Single lock acquisition makes the batch atomic for readers.
        let mut partitions = self.partitions.write();
        for op in operations {
            match op {
                Operation::Put {
                    partition,
                    key,
                    value,
                } => {
                    partitions
                        .entry(partition.name().to_string())
                        .or_default()
                        .insert(key, value);
                }
                Operation::Delete { partition, key } => {
                    if let Some(map) = partitions.get_mut(partition.name()) {
                        map.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn scan(&self, partition: &Partition, prefix: Option<&[u8]>) -> Result<KvIterator<'_>> {
        let partitions = self.partitions.read();
        let entries: Vec<(Vec<u8>, Vec<u8>)> = match partitions.get(partition.name()) {
            Some(map) => map
                .iter()
                .filter(|(k, _)| prefix.map_or(true, |p| k.starts_with(p)))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => Vec::new(),
        };
        Ok(Box::new(entries.into_iter()))
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.partitions.read().contains_key(partition.name())
    }
}
