//! Entry point to the persistent data model.

use crate::namespaces::NamespaceStore;
use crate::users::UserStore;
use kappa_commons::{NAMESPACES_PARTITION, USERS_PARTITION};
use kappa_store::{InMemoryBackend, RocksDbBackend, StorageBackend};
use std::path::Path;
use std::sync::Arc;

/// Access to everything the database knows about itself: users and
/// namespaces over one shared storage backend.
///
/// Cheap to clone and safe to share across connections.
#[derive(Clone)]
pub struct System {
    backend: Arc<dyn StorageBackend>,
}

impl System {
    /// Opens (or creates) the metadata database at the given path.
    pub fn open(path: &Path) -> crate::Result<Self> {
        let backend = RocksDbBackend::open(path, &[USERS_PARTITION, NAMESPACES_PARTITION])?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// An ephemeral system for tests.
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(InMemoryBackend::new()),
        }
    }

    pub fn users(&self) -> UserStore {
        UserStore::new(self.backend.clone())
    }

    pub fn namespaces(&self) -> NamespaceStore {
        NamespaceStore::new(self.backend.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kappa_commons::{NamespaceName, UserName};
    use tempfile::TempDir;

    #[test]
    fn test_open_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.db");

        {
            let system = System::open(&path).unwrap();
            system.users().create(&UserName::new("admin")).unwrap();
            system
                .namespaces()
                .create(&NamespaceName::new("acme"))
                .unwrap();
        }

        // Records survive a reopen.
        let system = System::open(&path).unwrap();
        assert!(system.users().get(&UserName::new("admin")).is_ok());
        assert!(system
            .namespaces()
            .exists(&NamespaceName::new("acme"))
            .unwrap());
    }

    #[test]
    fn test_stores_share_one_backend() {
        let system = System::in_memory();
        system.users().create(&UserName::new("bob")).unwrap();
        assert!(system.clone().users().get(&UserName::new("bob")).is_ok());
    }
}
