//! Key layout for the `users` and `namespaces` partitions.
//!
//! Each record is a group of keys under its owner's name:
//!
//! ```text
//! users/          <name>                      record marker (empty value)
//!                 <name>/salt                 16 random bytes
//!                 <name>/salted_password      SHA-256(salt || password)
//!                 <name>/namespaces/<ns>      comma-joined role names
//!                 <name>/keys/<fingerprint>   marshalled SSH public key
//!
//! namespaces/     <name>                      record marker (empty value)
//!                 <name>/users                comma-joined usernames
//!                 <name>/roles/<role>         comma-joined permissions
//! ```
//!
//! `/` separates path segments, so record names themselves may not contain
//! it. Dotted namespace paths are plain top-level records: `acme` and
//! `acme.logs` are siblings in the partition.

use crate::error::{DataModelError, Result};

pub const SEPARATOR: u8 = b'/';

/// Rejects names that are empty or would collide with the key layout.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(SEPARATOR as char) {
        return Err(DataModelError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// `<owner>/<field>`
pub fn field_key(owner: &str, field: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(owner.len() + field.len() + 1);
    key.extend_from_slice(owner.as_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(field.as_bytes());
    key
}

/// `<owner>/<group>/<member>`
pub fn member_key(owner: &str, group: &str, member: &str) -> Vec<u8> {
    let mut key = field_key(owner, group);
    key.push(SEPARATOR);
    key.extend_from_slice(member.as_bytes());
    key
}

/// `<owner>/<group>/`, the prefix covering every member of a group.
pub fn group_prefix(owner: &str, group: &str) -> Vec<u8> {
    let mut key = field_key(owner, group);
    key.push(SEPARATOR);
    key
}

/// `<owner>/`, the prefix covering every key of a record except its marker.
pub fn record_prefix(owner: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(owner.len() + 1);
    key.extend_from_slice(owner.as_bytes());
    key.push(SEPARATOR);
    key
}

/// Splits a comma-joined list value, dropping empty entries.
pub fn split_list(value: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(value)
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Joins entries into a comma-joined list value.
pub fn join_list<S: AsRef<str>>(entries: &[S]) -> Vec<u8> {
    entries
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(",")
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("acme.logs").is_ok());
        assert!(validate_name("bugs.bunny").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("a/b").is_err());
    }

    #[test]
    fn test_key_shapes() {
        assert_eq!(field_key("bob", "salt"), b"bob/salt".to_vec());
        assert_eq!(
            member_key("bob", "namespaces", "acme.logs"),
            b"bob/namespaces/acme.logs".to_vec()
        );
        assert_eq!(group_prefix("acme", "roles"), b"acme/roles/".to_vec());
        assert_eq!(record_prefix("acme"), b"acme/".to_vec());
    }

    #[test]
    fn test_list_roundtrip() {
        assert_eq!(split_list(b"guest,admin"), vec!["guest", "admin"]);
        assert_eq!(split_list(b""), Vec::<String>::new());
        assert_eq!(join_list(&["guest", "admin"]), b"guest,admin".to_vec());
        assert_eq!(join_list::<&str>(&[]), b"".to_vec());
    }
}
