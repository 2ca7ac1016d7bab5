//! Shared building blocks for the Kappa server crates.
//!
//! Provides the type-safe name wrappers used across the data model, parser,
//! and executor, plus the permission strings and storage constants the
//! authorization engine is anchored on.

pub mod names;
pub mod permissions;

pub use names::{NamespaceName, RoleName, UserName};

/// Name of the partition holding user records.
pub const USERS_PARTITION: &str = "users";

/// Name of the partition holding namespace records.
pub const NAMESPACES_PARTITION: &str = "namespaces";

/// File name of the embedded metadata database, relative to the data directory.
pub const META_DB: &str = "meta.db";

/// The reserved administrator account name.
///
/// Admin status is derived, not stored: a user is the administrator iff their
/// name equals this constant. All admin checks go through [`is_admin`].
pub const ADMIN_USERNAME: &str = "admin";

/// Returns true if the given username is the administrator account.
#[inline]
pub fn is_admin(name: &UserName) -> bool {
    name.as_str() == ADMIN_USERNAME
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        assert!(is_admin(&UserName::new("admin")));
        assert!(!is_admin(&UserName::new("Admin")));
        assert!(!is_admin(&UserName::new("administrator")));
        assert!(!is_admin(&UserName::new("")));
    }
}
