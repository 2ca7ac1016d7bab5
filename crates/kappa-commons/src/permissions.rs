//! Permission strings checked by the statement executor.
//!
//! Permissions are exact strings with no wildcard expansion. A role holds a
//! permission iff the permission appears verbatim in the role's list.

/// Required to create a child namespace under a parent.
pub const CREATE_NAMESPACE: &str = "create.namespace";

/// Required to drop a child namespace under a parent.
pub const DROP_NAMESPACE: &str = "drop.namespace";

/// Required to list namespaces.
pub const SHOW_NAMESPACES: &str = "show.namespaces";
