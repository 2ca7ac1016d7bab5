//! SSH public keys and per-user key rings.
//!
//! The key ring stores each key under its fingerprint in the user's record.
//! Equality is constant-time over the marshalled wire form.

use crate::auth::{create_fingerprint, secure_compare};
use crate::error::{DataModelError, Result};
use crate::keyspace;
use kappa_commons::{UserName, USERS_PARTITION};
use kappa_store::{Partition, StorageBackend};
use ssh_encoding::Encode;
use ssh_key::public::KeyData;
use ssh_key::{Certificate, PublicKey};
use std::sync::Arc;

/// A marshalled SSH public key plus its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyEntry {
    fingerprint: String,
    key: Vec<u8>,
}

impl PublicKeyEntry {
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            fingerprint: create_fingerprint(&key),
            key,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The marshalled wire form of the key.
    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Constant-time equivalence against another marshalled key.
    pub fn equals(&self, other: &[u8]) -> bool {
        secure_compare(&self.key, other)
    }
}

/// Marshals raw public key data into its wire form.
pub fn marshal_key_data(data: &KeyData) -> Result<Vec<u8>> {
    let mut blob = Vec::new();
    data.encode(&mut blob)
        .map_err(|_| DataModelError::FailedKeyConversion)?;
    Ok(blob)
}

/// Marshals an SSH public key into its wire form.
pub fn marshal_public_key(key: &PublicKey) -> Result<Vec<u8>> {
    marshal_key_data(key.key_data())
}

/// Extracts the marshalled public key from OpenSSH key material.
///
/// Accepts either a bare public key (`ssh-ed25519 AAAA…`) or an OpenSSH
/// certificate; certificates contribute their inner public key.
pub fn parse_public_key_material(bytes: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(bytes).map_err(|_| DataModelError::InvalidCertificate)?;

    if let Ok(cert) = Certificate::from_openssh(text) {
        return marshal_key_data(cert.public_key());
    }

    let key = PublicKey::from_openssh(text).map_err(|_| DataModelError::InvalidCertificate)?;
    marshal_public_key(&key)
}

/// A user's set of authorized public keys.
pub struct KeyRing {
    user: UserName,
    backend: Arc<dyn StorageBackend>,
}

impl KeyRing {
    pub(crate) fn new(user: UserName, backend: Arc<dyn StorageBackend>) -> Self {
        Self { user, backend }
    }

    fn partition(&self) -> Partition {
        Partition::new(USERS_PARTITION)
    }

    fn require_user(&self) -> Result<()> {
        let marker = self
            .backend
            .get(&self.partition(), self.user.as_str().as_bytes())?;
        if marker.is_none() {
            return Err(DataModelError::UserDoesNotExist);
        }
        Ok(())
    }

    /// Adds a public key to the ring and returns its fingerprint.
    pub fn add_public_key(&self, material: &[u8]) -> Result<String> {
        self.require_user()?;
        let blob = parse_public_key_material(material)?;
        self.add_marshalled_key(blob)
    }

    /// Adds an already-marshalled key to the ring.
    pub fn add_marshalled_key(&self, blob: Vec<u8>) -> Result<String> {
        self.require_user()?;
        let fingerprint = create_fingerprint(&blob);
        let key = keyspace::member_key(self.user.as_str(), "keys", &fingerprint);
        self.backend.put(&self.partition(), &key, &blob)?;
        Ok(fingerprint)
    }

    /// Removes a public key by fingerprint.
    pub fn remove_public_key(&self, fingerprint: &str) -> Result<()> {
        self.require_user()?;
        let key = keyspace::member_key(self.user.as_str(), "keys", fingerprint);
        self.backend.delete(&self.partition(), &key)?;
        Ok(())
    }

    /// Returns all keys in the ring, ordered by fingerprint.
    pub fn list_public_keys(&self) -> Result<Vec<PublicKeyEntry>> {
        let prefix = keyspace::group_prefix(self.user.as_str(), "keys");
        let entries = self
            .backend
            .scan(&self.partition(), Some(&prefix))?
            .map(|(_, blob)| PublicKeyEntry::new(blob))
            .collect();
        Ok(entries)
    }

    /// Determines whether a marshalled key exists in the ring.
    pub fn contains(&self, marshalled: &[u8]) -> Result<bool> {
        let fingerprint = create_fingerprint(marshalled);
        let key = keyspace::member_key(self.user.as_str(), "keys", &fingerprint);
        match self.backend.get(&self.partition(), &key)? {
            Some(stored) => Ok(secure_compare(&stored, marshalled)),
            None => Ok(false),
        }
    }
}
