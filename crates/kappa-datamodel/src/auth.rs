//! Salted password hashing, constant-time comparison, and key fingerprints.

use md5::{Digest as Md5Digest, Md5};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Size of the salt prepended to password hashes.
pub const SALT_SIZE: usize = 16;

/// Creates a new random salt and hashes the given secret with it.
///
/// Returns `(salt, SHA-256(salt || secret))`.
pub fn generate_salt(secret: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut salt = vec![0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    (salt.clone(), salt_secret(&salt, secret))
}

/// Hashes a secret with an existing salt.
pub fn salt_secret(salt: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut hash = Sha256::new();
    hash.update(salt);
    hash.update(secret);
    hash.finalize().to_vec()
}

/// Compares two byte strings in constant time.
///
/// Unequal lengths short-circuit to false after a dummy comparison so the
/// wall-clock time stays stable.
pub fn secure_compare(given: &[u8], actual: &[u8]) -> bool {
    if given.len() == actual.len() {
        given.ct_eq(actual).into()
    } else {
        let _: bool = actual.ct_eq(actual).into();
        false
    }
}

/// Renders the MD5 of a marshalled SSH public key as colon-separated hex
/// byte-pairs, e.g. `9f:2b:…`.
///
/// Non-cryptographic; used for identification, not authentication.
pub fn create_fingerprint(key: &[u8]) -> String {
    let digest = Md5::digest(key);
    digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}
