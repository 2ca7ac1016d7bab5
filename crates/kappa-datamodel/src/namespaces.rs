//! Namespaces: tenant scopes owning users and role→permission sets.

use crate::error::{DataModelError, Result};
use crate::keyspace;
use kappa_commons::{NamespaceName, RoleName, UserName, NAMESPACES_PARTITION};
use kappa_store::{Operation, Partition, StorageBackend};
use std::sync::Arc;

fn partition() -> Partition {
    Partition::new(NAMESPACES_PARTITION)
}

/// Store of all namespace records.
#[derive(Clone)]
pub struct NamespaceStore {
    backend: Arc<dyn StorageBackend>,
}

impl NamespaceStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Creates a namespace record if it does not already exist.
    pub fn create(&self, name: &NamespaceName) -> Result<Namespace> {
        keyspace::validate_name(name.as_str())?;
        let marker = name.as_str().as_bytes();
        if self.backend.get(&partition(), marker)?.is_none() {
            self.backend.put(&partition(), marker, b"")?;
        }
        Ok(Namespace {
            name: name.clone(),
            backend: self.backend.clone(),
        })
    }

    /// Returns a namespace, creating it when absent.
    ///
    /// Callers that need a strict existence check use [`Self::exists`]; the
    /// statement executor does so before every `USE`.
    pub fn get(&self, name: &NamespaceName) -> Result<Namespace> {
        self.create(name)
    }

    /// Strict existence check; never creates.
    pub fn exists(&self, name: &NamespaceName) -> Result<bool> {
        Ok(self
            .backend
            .get(&partition(), name.as_str().as_bytes())?
            .is_some())
    }

    /// Removes a namespace record and everything beneath it.
    pub fn delete(&self, name: &NamespaceName) -> Result<()> {
        let prefix = keyspace::record_prefix(name.as_str());
        let mut ops: Vec<Operation> = self
            .backend
            .scan(&partition(), Some(&prefix))?
            .map(|(key, _)| Operation::Delete {
                partition: partition(),
                key,
            })
            .collect();
        ops.push(Operation::Delete {
            partition: partition(),
            key: name.as_str().as_bytes().to_vec(),
        });
        self.backend.batch(ops)?;
        Ok(())
    }

    /// Lazily yields every namespace name in order.
    ///
    /// The iterator holds a consistent snapshot of the partition; drop it to
    /// release the read scope.
    pub fn stream_names(&self) -> Result<impl Iterator<Item = NamespaceName> + '_> {
        let iter = self.backend.scan(&partition(), None)?;
        Ok(iter.filter_map(|(key, _)| {
            // Record markers are the only keys without a path separator.
            if key.contains(&keyspace::SEPARATOR) {
                None
            } else {
                Some(NamespaceName::new(
                    String::from_utf8_lossy(&key).into_owned(),
                ))
            }
        }))
    }
}

/// A handle to one namespace record.
#[derive(Clone)]
pub struct Namespace {
    name: NamespaceName,
    backend: Arc<dyn StorageBackend>,
}

impl Namespace {
    pub fn name(&self) -> &NamespaceName {
        &self.name
    }

    fn exists(&self) -> Result<bool> {
        Ok(self
            .backend
            .get(&partition(), self.name.as_str().as_bytes())?
            .is_some())
    }

    fn require(&self) -> Result<()> {
        if !self.exists()? {
            return Err(DataModelError::NamespaceDoesNotExist);
        }
        Ok(())
    }

    fn users_key(&self) -> Vec<u8> {
        keyspace::field_key(self.name.as_str(), "users")
    }

    fn role_key(&self, role: &str) -> Vec<u8> {
        keyspace::member_key(self.name.as_str(), "roles", role)
    }

    /// Usernames authorized for this namespace, in insertion order.
    pub fn users(&self) -> Result<Vec<UserName>> {
        let users = match self.backend.get(&partition(), &self.users_key())? {
            Some(value) => keyspace::split_list(&value)
                .into_iter()
                .map(UserName::new)
                .collect(),
            None => Vec::new(),
        };
        Ok(users)
    }

    /// True iff the user appears in the namespace's user list.
    pub fn has_access(&self, user: &UserName) -> bool {
        self.users()
            .map(|users| users.iter().any(|u| u == user))
            .unwrap_or(false)
    }

    /// Registers a user with the namespace.
    pub fn add_user(&self, user: &UserName) -> Result<()> {
        self.require()?;
        let mut users = self.users()?;
        if !users.iter().any(|u| u == user) {
            users.push(user.clone());
            self.backend
                .put(&partition(), &self.users_key(), &keyspace::join_list(&users))?;
        }
        Ok(())
    }

    /// Unregisters a user from the namespace.
    pub fn remove_user(&self, user: &UserName) -> Result<()> {
        self.require()?;
        let users: Vec<UserName> = self
            .users()?
            .into_iter()
            .filter(|u| u != user)
            .collect();
        self.backend
            .put(&partition(), &self.users_key(), &keyspace::join_list(&users))?;
        Ok(())
    }

    /// Role names defined in this namespace, in name order.
    pub fn roles(&self) -> Result<Vec<RoleName>> {
        let prefix = keyspace::group_prefix(self.name.as_str(), "roles");
        let roles = self
            .backend
            .scan(&partition(), Some(&prefix))?
            .map(|(key, _)| RoleName::new(String::from_utf8_lossy(&key[prefix.len()..]).into_owned()))
            .collect();
        Ok(roles)
    }

    /// Defines a role. Existing roles keep their permissions.
    pub fn add_role(&self, role: &RoleName) -> Result<()> {
        self.require()?;
        let key = self.role_key(role.as_str());
        if self.backend.get(&partition(), &key)?.is_none() {
            self.backend.put(&partition(), &key, b"")?;
        }
        Ok(())
    }

    /// Removes a role and its permissions.
    pub fn remove_role(&self, role: &RoleName) -> Result<()> {
        self.require()?;
        self.backend
            .delete(&partition(), &self.role_key(role.as_str()))?;
        Ok(())
    }

    /// Grants permissions to a role, defining the role if needed.
    pub fn grant_permissions(&self, role: &RoleName, permissions: &[&str]) -> Result<()> {
        self.require()?;
        let key = self.role_key(role.as_str());
        let mut current = match self.backend.get(&partition(), &key)? {
            Some(value) => keyspace::split_list(&value),
            None => Vec::new(),
        };
        for permission in permissions {
            if !current.iter().any(|p| p == permission) {
                current.push(permission.to_string());
            }
        }
        self.backend
            .put(&partition(), &key, &keyspace::join_list(&current))?;
        Ok(())
    }

    /// Revokes a single permission from a role. Unknown roles are a no-op.
    pub fn revoke_permission(&self, role: &RoleName, permission: &str) -> Result<()> {
        self.require()?;
        let key = self.role_key(role.as_str());
        if let Some(value) = self.backend.get(&partition(), &key)? {
            let remaining: Vec<String> = keyspace::split_list(&value)
                .into_iter()
                .filter(|p| p != permission)
                .collect();
            self.backend
                .put(&partition(), &key, &keyspace::join_list(&remaining))?;
        }
        Ok(())
    }

    /// True iff the role exists and its permission list contains the
    /// permission exactly. No wildcard expansion.
    pub fn has_permission(&self, role: &RoleName, permission: &str) -> bool {
        match self.backend.get(&partition(), &self.role_key(role.as_str())) {
            Ok(Some(value)) => keyspace::split_list(&value).iter().any(|p| p == permission),
            _ => false,
        }
    }
}
