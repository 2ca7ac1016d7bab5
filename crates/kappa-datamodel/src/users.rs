//! User accounts: passwords, key rings, and per-namespace role assignments.

use crate::auth::{generate_salt, salt_secret, secure_compare};
use crate::error::{DataModelError, Result};
use crate::keys::KeyRing;
use crate::keyspace;
use kappa_commons::{NamespaceName, RoleName, UserName, USERS_PARTITION};
use kappa_store::{Operation, Partition, StorageBackend};
use std::sync::Arc;

fn partition() -> Partition {
    Partition::new(USERS_PARTITION)
}

/// Store of all login identities.
#[derive(Clone)]
pub struct UserStore {
    backend: Arc<dyn StorageBackend>,
}

impl UserStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Creates a user record if it does not already exist.
    pub fn create(&self, name: &UserName) -> Result<User> {
        keyspace::validate_name(name.as_str())?;
        let marker = name.as_str().as_bytes();
        if self.backend.get(&partition(), marker)?.is_none() {
            self.backend.put(&partition(), marker, b"")?;
        }
        Ok(User {
            name: name.clone(),
            backend: self.backend.clone(),
        })
    }

    /// Returns a user by name. Strict: absent records are an error, never
    /// created implicitly.
    pub fn get(&self, name: &UserName) -> Result<User> {
        let marker = name.as_str().as_bytes();
        if self.backend.get(&partition(), marker)?.is_none() {
            return Err(DataModelError::UserDoesNotExist);
        }
        Ok(User {
            name: name.clone(),
            backend: self.backend.clone(),
        })
    }

    /// Removes a user record and everything beneath it.
    pub fn delete(&self, name: &UserName) -> Result<()> {
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
}

/// A handle to one user record.
///
/// Cheap to clone; every method opens its own storage scope.
#[derive(Clone)]
pub struct User {
    name: UserName,
    backend: Arc<dyn StorageBackend>,
}

impl User {
    pub fn name(&self) -> &UserName {
        &self.name
    }

    /// Admin status is derived from the name, never stored.
    pub fn is_admin(&self) -> bool {
        kappa_commons::is_admin(&self.name)
    }

    fn exists(&self) -> Result<bool> {
        Ok(self
            .backend
            .get(&partition(), self.name.as_str().as_bytes())?
            .is_some())
    }

    /// Validates a password against the stored salted hash.
    ///
    /// False when the user, the salt, or the hash is missing. Only the web UI
    /// consults passwords; SSH never does.
    pub fn validate_password(&self, password: &str) -> bool {
        let salt = match self
            .backend
            .get(&partition(), &keyspace::field_key(self.name.as_str(), "salt"))
        {
            Ok(Some(salt)) => salt,
            _ => return false,
        };
        let stored = match self.backend.get(
            &partition(),
            &keyspace::field_key(self.name.as_str(), "salted_password"),
        ) {
            Ok(Some(stored)) => stored,
            _ => return false,
        };
        secure_compare(&salt_secret(&salt, password.as_bytes()), &stored)
    }

    /// Replaces the stored salt and salted password hash atomically.
    pub fn update_password(&self, password: &str) -> Result<()> {
        if !self.exists()? {
            return Err(DataModelError::UserDoesNotExist);
        }
        let (salt, hashed) = generate_salt(password.as_bytes());
        self.backend.batch(vec![
            Operation::Put {
                partition: partition(),
                key: keyspace::field_key(self.name.as_str(), "salt"),
                value: salt,
            },
            Operation::Put {
                partition: partition(),
                key: keyspace::field_key(self.name.as_str(), "salted_password"),
                value: hashed,
            },
        ])?;
        Ok(())
    }

    /// The user's set of authorized public keys.
    pub fn key_ring(&self) -> KeyRing {
        KeyRing::new(self.name.clone(), self.backend.clone())
    }

    /// Namespaces the user is assigned roles in, in name order.
    pub fn namespaces(&self) -> Result<Vec<NamespaceName>> {
        let prefix = keyspace::group_prefix(self.name.as_str(), "namespaces");
        let names = self
            .backend
            .scan(&partition(), Some(&prefix))?
            .map(|(key, _)| {
                NamespaceName::new(String::from_utf8_lossy(&key[prefix.len()..]).into_owned())
            })
            .collect();
        Ok(names)
    }

    /// The user's roles within the given namespace. Empty when the user has
    /// no assignment there.
    pub fn roles(&self, namespace: &NamespaceName) -> Result<Vec<RoleName>> {
        let key = keyspace::member_key(self.name.as_str(), "namespaces", namespace.as_str());
        let roles = match self.backend.get(&partition(), &key)? {
            Some(value) => keyspace::split_list(&value)
                .into_iter()
                .map(RoleName::new)
                .collect(),
            None => Vec::new(),
        };
        Ok(roles)
    }

    /// Appends a role to the user's assignment for a namespace.
    pub fn add_role(&self, namespace: &NamespaceName, role: &RoleName) -> Result<()> {
        if !self.exists()? {
            return Err(DataModelError::UserDoesNotExist);
        }
        let key = keyspace::member_key(self.name.as_str(), "namespaces", namespace.as_str());
        let mut roles = match self.backend.get(&partition(), &key)? {
            Some(value) => keyspace::split_list(&value),
            None => Vec::new(),
        };
        if !roles.iter().any(|r| r == role.as_str()) {
            roles.push(role.as_str().to_string());
            self.backend
                .put(&partition(), &key, &keyspace::join_list(&roles))?;
        }
        Ok(())
    }

    /// Removes a role from the user's assignment for a namespace.
    pub fn remove_role(&self, namespace: &NamespaceName, role: &RoleName) -> Result<()> {
        if !self.exists()? {
            return Err(DataModelError::UserDoesNotExist);
        }
        let key = keyspace::member_key(self.name.as_str(), "namespaces", namespace.as_str());
        if let Some(value) = self.backend.get(&partition(), &key)? {
            let roles: Vec<String> = keyspace::split_list(&value)
                .into_iter()
                .filter(|r| r != role.as_str())
                .collect();
            self.backend
                .put(&partition(), &key, &keyspace::join_list(&roles))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::System;

    fn store() -> UserStore {
        System::in_memory().users()
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let users = store();
        assert!(matches!(
            users.create(&UserName::new("")),
            Err(DataModelError::InvalidName(_))
        ));
    }

    #[test]
    fn test_create_and_get() {
        let users = store();
        users.create(&UserName::new("acme")).unwrap();
        assert!(users.get(&UserName::new("acme")).is_ok());
    }

    #[test]
    fn test_get_is_strict() {
        let users = store();
        assert!(matches!(
            users.get(&UserName::new("acme.none")),
            Err(DataModelError::UserDoesNotExist)
        ));
    }

    #[test]
    fn test_create_is_idempotent() {
        let users = store();
        let user = users.create(&UserName::new("bob")).unwrap();
        user.update_password("password").unwrap();

        users.create(&UserName::new("bob")).unwrap();
        let user = users.get(&UserName::new("bob")).unwrap();
        assert!(user.validate_password("password"));
    }

    #[test]
    fn test_delete() {
        let users = store();
        let user = users.create(&UserName::new("acme.delete")).unwrap();
        user.update_password("password").unwrap();

        users.delete(&UserName::new("acme.delete")).unwrap();
        assert!(users.get(&UserName::new("acme.delete")).is_err());
        assert!(!user.validate_password("password"));
    }

    #[test]
    fn test_validate_password_no_user() {
        let users = store();
        let user = users.create(&UserName::new("ghostcheck")).unwrap();
        users.delete(&UserName::new("ghostcheck")).unwrap();
        assert!(!user.validate_password("password"));
    }

    #[test]
    fn test_validate_password_not_set() {
        let users = store();
        let user = users.create(&UserName::new("acme.nopassword")).unwrap();
        assert!(!user.validate_password("password"));
    }

    #[test]
    fn test_validate_password() {
        let users = store();
        let user = users.create(&UserName::new("acme.password")).unwrap();
        user.update_password("password").unwrap();

        assert!(user.validate_password("password"));
        assert!(!user.validate_password("shaken, not stirred"));
    }

    #[test]
    fn test_update_password_invalid_user() {
        let users = store();
        let user = users.create(&UserName::new("fleeting")).unwrap();
        users.delete(&UserName::new("fleeting")).unwrap();
        assert!(user.update_password("password").is_err());
    }

    #[test]
    fn test_namespaces_sorted() {
        let users = store();
        let user = users.create(&UserName::new("acme.user")).unwrap();
        user.add_role(&NamespaceName::new("acme.users"), &RoleName::new("guest"))
            .unwrap();
        user.add_role(
            &NamespaceName::new("acme.trending"),
            &RoleName::new("guest"),
        )
        .unwrap();

        let namespaces = user.namespaces().unwrap();
        assert_eq!(
            namespaces,
            vec![
                NamespaceName::new("acme.trending"),
                NamespaceName::new("acme.users")
            ]
        );
    }

    #[test]
    fn test_roles() {
        let users = store();
        let user = users.create(&UserName::new("acme.roles")).unwrap();
        user.add_role(&NamespaceName::new("acme.users"), &RoleName::new("guest"))
            .unwrap();
        user.add_role(&NamespaceName::new("acme.users"), &RoleName::new("admin"))
            .unwrap();

        assert_eq!(
            user.roles(&NamespaceName::new("acme.users")).unwrap(),
            vec![RoleName::new("guest"), RoleName::new("admin")]
        );
        assert!(user
            .roles(&NamespaceName::new("invalid.namespace"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_remove_role() {
        let users = store();
        let user = users.create(&UserName::new("acme.remove.role")).unwrap();
        let ns = NamespaceName::new("acme.namespace");
        user.add_role(&ns, &RoleName::new("create.log")).unwrap();
        user.add_role(&ns, &RoleName::new("create.view")).unwrap();

        user.remove_role(&ns, &RoleName::new("create.log")).unwrap();
        assert_eq!(user.roles(&ns).unwrap(), vec![RoleName::new("create.view")]);

        user.remove_role(&ns, &RoleName::new("create.view"))
            .unwrap();
        assert!(user.roles(&ns).unwrap().is_empty());
    }

    #[test]
    fn test_is_admin() {
        let users = store();
        let admin = users.create(&UserName::new("admin")).unwrap();
        let bob = users.create(&UserName::new("bob")).unwrap();
        assert!(admin.is_admin());
        assert!(!bob.is_admin());
    }
}
